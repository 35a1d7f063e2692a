//! Two clients playing one game through a shared in-process store.

use blackhole_core::{index_to_coords, Outcome, Status, FIELDS, MAX_VALUE};
use blackhole_sync::{
    create_game, GameSession, MemoryStore, SessionPhase, Snapshot, SubmitOutcome, SyncConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const SETUP: &str = "0010203040";

fn fast_config() -> SyncConfig {
    SyncConfig::default()
        .with_poll_delay(Duration::from_millis(1))
        .with_unchanged_etag_backoff(Duration::from_millis(10))
}

async fn wait_for_moves(updates: &mut watch::Receiver<Option<Snapshot>>, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let reached = updates
                .borrow_and_update()
                .as_ref()
                .is_some_and(|s| s.state.move_count() >= count);
            if reached {
                return;
            }
            updates.changed().await.unwrap();
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for move {}", count));
}

#[tokio::test]
async fn test_full_game_between_two_sessions() {
    let store = Arc::new(MemoryStore::new());
    let id = create_game(store.as_ref(), SETUP).await.unwrap();

    let red = GameSession::new(Arc::clone(&store), id.clone(), fast_config());
    let blue = GameSession::new(Arc::clone(&store), id.clone(), fast_config());
    red.initialize().await.unwrap();
    blue.initialize().await.unwrap();

    let mut red_updates = red.subscribe();
    let mut blue_updates = blue.subscribe();
    let red_poller = red.spawn_polling();
    let blue_poller = blue.spawn_polling();

    // Fill the free fields in index order; H1 (the last field) stays empty
    let free_fields = 5..FIELDS - 1;
    for (turn, field_index) in free_fields.enumerate() {
        let coords = index_to_coords(field_index).unwrap();
        let round = (turn / 2) as i32;
        let (session, value) = if turn % 2 == 0 {
            (&red, MAX_VALUE - round)
        } else {
            (&blue, -(1 + round))
        };

        let outcome = session.submit_move(coords, value).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted, "turn {}", turn);

        let count = 5 + turn + 1;
        wait_for_moves(&mut red_updates, count).await;
        wait_for_moves(&mut blue_updates, count).await;
    }

    let red_state = red.state().unwrap();
    let blue_state = blue.state().unwrap();
    assert_eq!(red_state, blue_state);
    assert!(red_state.is_finished());
    assert_eq!(red_state.encode(), store.get(&id).unwrap().0);

    // H1 touches G1 (red 1) and G2 (blue -15)
    assert_eq!(
        red_state.status(),
        Status::Finished {
            score: -14,
            outcome: Outcome::BlueWins
        }
    );

    red.shutdown();
    blue.shutdown();
    assert!(red_poller.await.unwrap().is_ok());
    assert!(blue_poller.await.unwrap().is_ok());
    assert_eq!(red.phase(), SessionPhase::Closed);
}

#[tokio::test]
async fn test_loser_of_a_race_sees_the_winner_move() {
    let store = Arc::new(MemoryStore::new());
    let id = create_game(store.as_ref(), SETUP).await.unwrap();

    let first = GameSession::new(Arc::clone(&store), id.clone(), fast_config());
    let second = GameSession::new(Arc::clone(&store), id.clone(), fast_config());
    first.initialize().await.unwrap();
    second.initialize().await.unwrap();

    let mut second_updates = second.subscribe();
    let poller = second.spawn_polling();

    let b1 = "B1".parse().unwrap();
    let c1 = "C1".parse().unwrap();
    assert_eq!(
        first.submit_move(b1, 15).await.unwrap(),
        SubmitOutcome::Accepted
    );
    assert_eq!(
        second.submit_move(c1, 15).await.unwrap(),
        SubmitOutcome::Conflict
    );

    wait_for_moves(&mut second_updates, 6).await;
    let state = second.state().unwrap();
    assert_eq!(state.encode(), format!("{}8f", SETUP));
    // Red's 15 is gone now, and it is blue's turn anyway
    assert!(!state.selectable(15));
    assert_eq!(
        second.submit_move(c1, 15).await.unwrap(),
        SubmitOutcome::InvalidMove
    );

    second.shutdown();
    assert!(poller.await.unwrap().is_ok());
}
