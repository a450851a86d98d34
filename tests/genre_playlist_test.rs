mod common;

use common::*;
use tastemaker::{
    config::GenrePlaylistConfig,
    db::Song,
    management::SongCache,
    playlists::{
        PlaylistOutcome,
        builder::add_tracks,
        genre::{GenrePlaylistRequest, collect_genre_tracks, create_genre_playlist},
    },
};

fn jazz_api(tracks: usize) -> FakeApi {
    let mut api = FakeApi::new("alice");
    api.add_artist("aj", "Jazz Artist", &["jazz", "bebop"]);
    api.track_searches
        .insert("genre:\"jazz\"".to_string(), numbered_tracks("j", tracks, "aj"));
    api
}

fn jazz_request(num_songs: usize) -> GenrePlaylistRequest {
    GenrePlaylistRequest {
        genre: "jazz".to_string(),
        num_songs,
    }
}

#[tokio::test]
async fn test_genre_playlist_from_empty_account() {
    let db = database_with_user("alice");
    let api = jazz_api(120);
    let cache = SongCache::new(&db, false);

    let outcome = create_genre_playlist(
        &api,
        &db,
        &cache,
        &GenrePlaylistConfig::default(),
        "alice",
        &jazz_request(30),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        PlaylistOutcome::Created {
            playlist_id: "playlist-1".to_string(),
            name: "jazz Playlist".to_string(),
            added: 30,
        }
    );
    assert_eq!(db.count_user_songs("alice").unwrap(), 30);
    assert_eq!(
        api.created(),
        vec![("alice".to_string(), "jazz Playlist".to_string())]
    );

    let added = api.added();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].len(), 30);
    assert!(added[0].iter().all(|uri| uri.starts_with("spotify:track:j")));

    let song = db.get_song("j0").unwrap().unwrap();
    assert_eq!(song.genres, vec!["jazz", "bebop"]);
}

#[tokio::test]
async fn test_failing_later_page_keeps_collected_tracks() {
    let db = database_with_user("alice");
    let mut api = jazz_api(120);
    api.search_fails_from = Some(50);
    let cache = SongCache::new(&db, false);

    let outcome = create_genre_playlist(
        &api,
        &db,
        &cache,
        &GenrePlaylistConfig::default(),
        "alice",
        &jazz_request(80),
    )
    .await
    .unwrap();

    // The first page still ends up in a playlist
    assert_eq!(
        outcome,
        PlaylistOutcome::Created {
            playlist_id: "playlist-1".to_string(),
            name: "jazz Playlist".to_string(),
            added: 50,
        }
    );
    assert_eq!(db.count_user_songs("alice").unwrap(), 50);
    assert_eq!(api.added()[0].len(), 50);
}

#[tokio::test]
async fn test_rejected_token_during_search_is_unauthorized() {
    let db = database_with_user("alice");
    let mut api = jazz_api(10);
    api.reject_token = true;
    let cache = SongCache::new(&db, false);

    let err = create_genre_playlist(
        &api,
        &db,
        &cache,
        &GenrePlaylistConfig::default(),
        "alice",
        &jazz_request(5),
    )
    .await
    .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(api.created().is_empty());
}

#[tokio::test]
async fn test_owned_tracks_are_skipped() {
    let db = database_with_user("alice");
    for i in 0..5 {
        let song = Song {
            track_id: format!("j{}", i),
            track_name: "Known".to_string(),
            ..Default::default()
        };
        db.insert_song(&song, "alice").unwrap();
    }
    let api = jazz_api(20);
    let cache = SongCache::new(&db, false);

    let ids = collect_genre_tracks(
        &api,
        &db,
        &cache,
        &GenrePlaylistConfig::default(),
        "alice",
        &jazz_request(10),
    )
    .await
    .unwrap();

    assert_eq!(ids.len(), 10);
    assert_eq!(ids[0], "j5");
    assert!(!ids.contains(&"j0".to_string()));
}

#[tokio::test]
async fn test_offset_ceiling_is_respected() {
    let db = database_with_user("alice");
    // Every search hit is already owned, so the loop only stops at the ceiling.
    for i in 0..100 {
        let song = Song {
            track_id: format!("j{}", i),
            track_name: "Known".to_string(),
            ..Default::default()
        };
        db.insert_song(&song, "alice").unwrap();
    }
    let api = jazz_api(100);
    let cache = SongCache::new(&db, false);
    let config = GenrePlaylistConfig {
        page_size: 10,
        offset_ceiling: 30,
        ..Default::default()
    };

    let ids = collect_genre_tracks(&api, &db, &cache, &config, "alice", &jazz_request(10))
        .await
        .unwrap();

    assert!(ids.is_empty());
    let offsets: Vec<u32> = api.searches().into_iter().map(|(_, offset)| offset).collect();
    assert_eq!(offsets, vec![0, 10, 20]);
}

#[tokio::test]
async fn test_short_search_stops_at_last_page() {
    let db = database_with_user("alice");
    let api = jazz_api(12);
    let cache = SongCache::new(&db, false);
    let config = GenrePlaylistConfig {
        page_size: 5,
        ..Default::default()
    };

    let ids = collect_genre_tracks(&api, &db, &cache, &config, "alice", &jazz_request(50))
        .await
        .unwrap();

    assert_eq!(ids.len(), 12);
    assert_eq!(api.searches().len(), 3);
}

#[tokio::test]
async fn test_empty_search_creates_no_playlist() {
    let db = database_with_user("alice");
    let api = FakeApi::new("alice");
    let cache = SongCache::new(&db, false);

    let outcome = create_genre_playlist(
        &api,
        &db,
        &cache,
        &GenrePlaylistConfig::default(),
        "alice",
        &jazz_request(30),
    )
    .await
    .unwrap();

    assert_eq!(outcome, PlaylistOutcome::NoTracks);
    assert!(api.created().is_empty());
}

#[tokio::test]
async fn test_tracks_are_added_in_chunks() {
    let api = FakeApi::new("alice");
    let ids: Vec<String> = (0..250).map(|i| format!("t{}", i)).collect();

    let added = add_tracks(&api, "playlist-1", &ids).await.unwrap();

    assert_eq!(added, 250);
    let sizes: Vec<usize> = api.added().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![100, 100, 50]);
    assert_eq!(api.added()[2][49], "spotify:track:t249");
}
