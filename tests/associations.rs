mod common;

use sqlobject::{AssocOptions, AssociationDescriptor, AssociationOptions, Database, Error, Record};

use common::{CountingStore, declare, setup, store};

fn names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.get_as::<String>("name").unwrap().unwrap_or_default())
        .collect()
}

#[test]
fn belongs_to_fetches_the_owner() {
    let db = setup();
    let onyx = db.find("Pokemon", 1).unwrap().unwrap();
    let brock = db.associated(&onyx, "GymLeader").unwrap().into_one().unwrap();
    assert_eq!(brock.type_name(), "GymLeader");
    assert_eq!(brock.get("name").unwrap(), &"Brock");

    let gym = db.associated(&brock, "gym").unwrap().into_one().unwrap();
    assert_eq!(gym.get("name").unwrap(), &"Rock");
}

#[test]
fn belongs_to_without_foreign_key_is_none() {
    let db = setup();
    let mewtwo = db.find("Pokemon", 5).unwrap().unwrap();
    assert!(db.associated(&mewtwo, "GymLeader").unwrap().into_one().is_none());
}

#[test]
fn has_many_fetches_every_child() {
    let db = setup();
    let surge = db.find("GymLeader", 3).unwrap().unwrap();
    let pokemons = db.associated(&surge, "pokemons").unwrap().into_many();
    assert_eq!(names(&pokemons), ["Electrode"]);

    let misty = db.find("GymLeader", 2).unwrap().unwrap();
    let pokemons = db.associated(&misty, "pokemons").unwrap().into_many();
    assert_eq!(names(&pokemons), ["Starmie", "Magikarp"]);

    let electric = db.find("Gym", 3).unwrap().unwrap();
    let leaders = db.associated(&electric, "gym_leaders").unwrap().into_many();
    assert_eq!(names(&leaders), ["Lt. Surge"]);
}

#[test]
fn has_many_without_children_is_empty() {
    let db = setup();
    let erika = db.find("GymLeader", 4).unwrap().unwrap();
    assert!(db.associated(&erika, "pokemons").unwrap().into_many().is_empty());
}

#[test]
fn registries_are_kept_per_type() {
    let mut db = setup();
    db.declare("TempClass");

    let pokemon = db.association_options("Pokemon").unwrap();
    assert_eq!(pokemon.len(), 2);
    assert!(pokemon.contains("GymLeader"));
    assert!(!pokemon.contains("pokemons"));
    assert_eq!(pokemon.get("gym").unwrap().kind(), "has_one_through");

    let leader = db.association_options("GymLeader").unwrap();
    assert!(leader.contains("pokemons"));
    assert!(!leader.contains("GymLeader"));
    match leader.get("pokemons").unwrap() {
        AssociationDescriptor::HasMany(options) => {
            assert_eq!(options.foreign_key, "gym_leader_id");
            assert_eq!(options.class_name, "Pokemon");
        }
        other => panic!("unexpected descriptor: {other:?}"),
    }

    assert!(db.association_options("TempClass").unwrap().is_empty());
}

#[test]
fn has_one_through_is_a_single_join() {
    let store = CountingStore::new();
    let mut db = Database::new(&store);
    declare(&mut db);
    let onyx = db.find("Pokemon", 1).unwrap().unwrap();

    let before = store.executions.get();
    let gym = db.associated(&onyx, "gym").unwrap().into_one().unwrap();
    assert_eq!(store.executions.get() - before, 1);
    assert_eq!(gym.type_name(), "Gym");
    assert_eq!(gym.get("name").unwrap(), &"Rock");
}

#[test]
fn has_one_through_without_intermediate_is_none() {
    let db = setup();
    let mewtwo = db.find("Pokemon", 5).unwrap().unwrap();
    assert!(db.associated(&mewtwo, "gym").unwrap().into_one().is_none());
}

#[test]
fn has_one_through_may_be_declared_before_its_targets() {
    let mut db = Database::new(store());
    db.declare("Pokemon")
        .has_one_through("gym", "GymLeader", "gym")
        .belongs_to("GymLeader", AssociationOptions::new().foreign_key("gym_leader_id"))
        .finalize()
        .unwrap();
    db.declare("Gym").finalize().unwrap();
    db.declare("GymLeader")
        .table_name("gym_leaders")
        .belongs_to("gym", AssociationOptions::new())
        .finalize()
        .unwrap();

    let starmie = db.find("Pokemon", 2).unwrap().unwrap();
    let gym = db.associated(&starmie, "gym").unwrap().into_one().unwrap();
    assert_eq!(gym.get("name").unwrap(), &"Water");
}

#[test]
fn unresolvable_targets_fail_when_followed() {
    let mut db = Database::new(store());
    db.declare("Pokemon")
        .belongs_to("GymLeader", AssociationOptions::new().foreign_key("gym_leader_id"))
        .belongs_to("trainer", AssociationOptions::new().foreign_key("gym_leader_id"))
        .finalize()
        .unwrap();
    // declared but never finalized
    db.declare("GymLeader").table_name("gym_leaders");

    let onyx = db.find("Pokemon", 1).unwrap().unwrap();
    match db.associated(&onyx, "GymLeader").unwrap_err() {
        Error::ClassResolution { type_name } => assert_eq!(type_name, "GymLeader"),
        other => panic!("unexpected error: {other}"),
    }
    match db.associated(&onyx, "trainer").unwrap_err() {
        Error::ClassResolution { type_name } => assert_eq!(type_name, "Trainer"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_associations_are_reported_by_name() {
    let mut db = setup();
    db.declare("Pokemon").has_one_through("hometown", "trainer", "town");
    db.declare("GymLeader").has_one_through("league", "gym", "league");

    let onyx = db.find("Pokemon", 1).unwrap().unwrap();
    match db.associated(&onyx, "evolution").unwrap_err() {
        Error::AssociationNotFound { type_name, association } => {
            assert_eq!(type_name, "Pokemon");
            assert_eq!(association, "evolution");
        }
        other => panic!("unexpected error: {other}"),
    }
    match db.associated(&onyx, "hometown").unwrap_err() {
        Error::AssociationNotFound { association, .. } => assert_eq!(association, "trainer"),
        other => panic!("unexpected error: {other}"),
    }

    let brock = db.find("GymLeader", 1).unwrap().unwrap();
    match db.associated(&brock, "league").unwrap_err() {
        Error::AssociationNotFound { type_name, association } => {
            assert_eq!(type_name, "Gym");
            assert_eq!(association, "league");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn link_resolves_everything_up_front() {
    let mut db = setup();
    db.link().unwrap();

    db.declare("Gym").belongs_to("region", AssociationOptions::new());
    assert!(matches!(db.link(), Err(Error::ClassResolution { .. })));
}

#[test]
fn link_reports_a_broken_through() {
    let mut db = setup();
    db.declare("Pokemon").has_one_through("hometown", "GymLeader", "town");
    match db.link().unwrap_err() {
        Error::AssociationNotFound { type_name, association } => {
            assert_eq!(type_name, "GymLeader");
            assert_eq!(association, "town");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn options_resolve_their_target_type_and_table() {
    let db = setup();
    let leader = AssocOptions::belongs_to("GymLeader", &AssociationOptions::new());
    assert_eq!(db.model_class(&leader).unwrap().type_name(), "GymLeader");
    assert_eq!(db.assoc_table_name(&leader).unwrap(), "gym_leaders");

    let pokemons = AssocOptions::has_many("pokemons", "GymLeader", &AssociationOptions::new());
    assert_eq!(db.model_class(&pokemons).unwrap().type_name(), "Pokemon");
    assert_eq!(db.assoc_table_name(&pokemons).unwrap(), "pokemons");

    let trainer = AssocOptions::belongs_to("trainer", &AssociationOptions::new());
    assert!(matches!(db.model_class(&trainer), Err(Error::ClassResolution { .. })));
    assert!(matches!(db.assoc_table_name(&trainer), Err(Error::ClassResolution { .. })));
}
