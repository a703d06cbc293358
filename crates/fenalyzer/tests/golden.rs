//! Golden key vectors through the public API.
//!
//! Keys are persisted, so any change here breaks every existing database.

use fenalyzer::core::{KeyScheme, Position, PositionKeyer};
use fenalyzer::store::MemoryStore;
use fenalyzer::{Retrieval, RetrievalService};
use fenalyzer_testkit::vectors::all_vectors;

#[test]
fn keyer_matches_golden_vectors() {
    for vector in all_vectors() {
        let scheme: KeyScheme = vector.scheme.parse().unwrap();
        let key = PositionKeyer::new(scheme).key(&Position::new(vector.fen).unwrap());
        assert_eq!(key.as_str(), vector.expected_key, "{}", vector.name);
    }
}

#[test]
fn saved_positions_are_found_under_golden_keys() {
    let store = MemoryStore::new();
    let service = RetrievalService::new(&store, PositionKeyer::default());

    for vector in all_vectors().into_iter().filter(|v| v.scheme == "sha256/16") {
        let (key, _) = service.save_position(vector.fen).unwrap();
        assert_eq!(key.as_str(), vector.expected_key);
        assert_eq!(
            service.retrieve(vector.expected_key).unwrap(),
            Retrieval::Found(Position::new(vector.fen).unwrap())
        );
    }
}

#[test]
fn uppercase_keys_are_accepted() {
    let store = MemoryStore::new();
    let service = RetrievalService::new(&store, PositionKeyer::default());
    service.save_position(Position::starting().as_str()).unwrap();

    assert!(service.retrieve("B1791D7FC9AE3D38").unwrap().is_found());
}
