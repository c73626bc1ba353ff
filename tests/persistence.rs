mod common;

use std::path::PathBuf;

use sqlobject::{Database, Error, PersistenceMode, SqliteStore, Store, Value};

use common::{POKEDEX, declare, setup};

#[test]
fn insert_adds_a_row_and_takes_the_generated_id() {
    let db = setup();
    let mut meowth = db
        .new_record("Pokemon", [("name", Value::from("Meowth")), ("gym_leader_id", 1.into())])
        .unwrap();
    db.insert(&mut meowth).unwrap();
    assert_eq!(db.all("Pokemon").unwrap().len(), 6);
    assert_eq!(meowth.id(), &Value::Integer(db.store().last_insert_id().unwrap()));
    assert_eq!(meowth.id(), &Value::Integer(6));
}

#[test]
fn inserted_record_can_be_found_again() {
    let db = setup();
    let mut meowth = db
        .new_record("Pokemon", [("name", Value::from("Meowth")), ("gym_leader_id", 1.into())])
        .unwrap();
    db.insert(&mut meowth).unwrap();
    let found = db.find("Pokemon", meowth.id().clone()).unwrap().unwrap();
    assert_eq!(found, meowth);
    assert_eq!(found.get("name").unwrap(), &"Meowth");
    assert_eq!(found.get("gym_leader_id").unwrap(), &Value::Integer(1));
}

#[test]
fn update_writes_every_column_by_id() {
    let db = setup();
    let mut misty = db.find("GymLeader", 2).unwrap().unwrap();
    misty.set("name", "Giovanni").unwrap();
    db.update(&mut misty).unwrap();

    let reloaded = db.find("GymLeader", 2).unwrap().unwrap();
    assert_eq!(reloaded.get("name").unwrap(), &"Giovanni");
    assert_eq!(reloaded.get("gym_id").unwrap(), &Value::Integer(2));
    assert_eq!(db.all("GymLeader").unwrap().len(), 4);
}

#[test]
fn save_inserts_new_records_and_updates_known_ones() {
    let db = setup();
    let mut gym = db.new_record("Gym", [("name", "Grass")]).unwrap();
    db.save(&mut gym).unwrap();
    assert_eq!(gym.id(), &Value::Integer(4));

    gym.set("name", "Celadon").unwrap();
    db.save(&mut gym).unwrap();
    let gyms = db.all("Gym").unwrap();
    assert_eq!(gyms.len(), 4);
    assert_eq!(gyms[3].get("name").unwrap(), &"Celadon");
}

#[test]
fn update_without_identity_fails() {
    let db = setup();
    let mut gym = db.new_record("Gym", [("name", "Grass")]).unwrap();
    match db.update(&mut gym).unwrap_err() {
        Error::Persistence { type_name, reason } => {
            assert_eq!(type_name, "Gym");
            assert_eq!(reason, "record has no identity");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(db.all("Gym").unwrap().len(), 3);
}

#[test]
fn store_constraints_surface_as_store_errors() {
    let db = setup();
    let mut nameless = db.new_record("Pokemon", [("gym_leader_id", 1)]).unwrap();
    assert!(matches!(db.insert(&mut nameless), Err(Error::Store(_))));
    assert!(nameless.id().is_null());

    let mut orphan = db
        .new_record("Pokemon", [("name", Value::from("Ditto")), ("gym_leader_id", 99.into())])
        .unwrap();
    assert!(matches!(db.save(&mut orphan), Err(Error::Store(_))));
    assert_eq!(db.all("Pokemon").unwrap().len(), 5);
}

#[test]
fn reset_restores_the_seeded_rows() {
    let db = setup();
    let mut meowth = db.new_record("Pokemon", [("name", "Meowth")]).unwrap();
    db.save(&mut meowth).unwrap();
    assert_eq!(db.all("Pokemon").unwrap().len(), 6);

    db.store().reset().unwrap();
    assert_eq!(db.all("Pokemon").unwrap().len(), 5);
    assert!(db.find("Pokemon", 6).unwrap().is_none());
}

#[test]
fn file_store_reset_starts_from_a_fresh_file() {
    let path: PathBuf = std::env::temp_dir().join(format!("sqlobject-reset-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let store = SqliteStore::with_seed(PersistenceMode::File(path.clone()), POKEDEX).unwrap();
    assert_eq!(store.mode(), &PersistenceMode::File(path.clone()));
    let mut db = Database::new(store);
    declare(&mut db);

    let mut gym = db.new_record("Gym", [("name", "Grass")]).unwrap();
    db.save(&mut gym).unwrap();
    assert!(path.exists());
    assert_eq!(db.all("Gym").unwrap().len(), 4);

    db.store().reset().unwrap();
    assert_eq!(db.all("Gym").unwrap().len(), 3);

    drop(db);
    std::fs::remove_file(&path).unwrap();
}
