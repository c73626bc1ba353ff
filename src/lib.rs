//! sqlobject – a small relational mapping layer over a SQL store.
//!
//! Rows of a table map to [`Record`]s of a declared record type. The layer
//! consists of:
//! * A schema registry ([`schema`]) that introspects each type's table once and
//!   keeps the column list, primary key first.
//! * An attribute store per record ([`record`]) holding every field value, with
//!   checked accessors by field name and typed accessors generated by
//!   [`model!`].
//! * A write path ([`persist`]) mapping records to INSERT and UPDATE statements.
//! * An equality query builder ([`searchable`]) that materializes rows back into
//!   records.
//! * An association registry ([`associatable`]) for `belongs_to`, `has_many` and
//!   `has_one_through`, resolved by name when followed.
//!
//! All of it is wired together by [`construct::Database`], an explicit value
//! owning the [`store::Store`] and the metadata of every declared type. There
//! is no global state: two databases never see each other's types.
//!
//! ## Lifecycle
//! Types are declared, given associations, and finalized once at startup
//! (`&mut Database`). Finalizing reads the table's columns and fixes the
//! record layout; only finalized types can build, search or follow
//! associations. After setup every operation takes `&Database` and performs
//! at most two sequential round trips to the store.
//!
//! ## Quick Start
//! ```
//! use sqlobject::{AssociationOptions, Criteria, Database, PersistenceMode, SqliteStore};
//! let store = SqliteStore::with_seed(
//!     PersistenceMode::InMemory,
//!     "CREATE TABLE gyms (id INTEGER PRIMARY KEY, name TEXT);
//!      CREATE TABLE gym_leaders (id INTEGER PRIMARY KEY, name TEXT, gym_id INTEGER);
//!      INSERT INTO gyms (name) VALUES ('Rock');",
//! ).unwrap();
//! let mut db = Database::new(store);
//! db.declare("Gym").has_many("gym_leaders", AssociationOptions::new()).finalize().unwrap();
//! db.declare("GymLeader").table_name("gym_leaders").belongs_to("gym", AssociationOptions::new()).finalize().unwrap();
//!
//! let mut brock = db.new_record("GymLeader", [("name", "Brock")]).unwrap();
//! brock.set("gym_id", 1).unwrap();
//! db.save(&mut brock).unwrap();
//!
//! let leaders = db.where_("GymLeader", &Criteria::new().and("gym_id", 1)).unwrap();
//! assert_eq!(leaders.len(), 1);
//! let gym = db.associated(&brock, "gym").unwrap().into_one().unwrap();
//! assert_eq!(gym.get("name").unwrap(), &"Rock");
//! ```
//!
//! ## Store
//! The layer needs very little from its backend: run a parameterized
//! statement and return rows, report a statement's column names, and return
//! the last generated key (see [`store::Store`]). [`store::SqliteStore`]
//! provides this over rusqlite and can be configured through
//! [`config::StoreConfig`].

pub mod associatable;
pub mod config;
pub mod construct;
pub mod datatype;
pub mod error;
pub mod inflect;
pub mod persist;
pub mod record;
pub mod schema;
pub mod searchable;
pub mod store;

pub use associatable::{AssocOptions, Associated, AssociationDescriptor, AssociationKeeper, AssociationOptions};
pub use config::StoreConfig;
pub use construct::{Database, Declaration};
pub use datatype::{FromValue, Value};
pub use error::{Error, Result};
pub use record::{Attributes, Model, Record};
pub use schema::{RecordType, Schema};
pub use searchable::Criteria;
pub use store::{PersistenceMode, Row, SqliteStore, Store};
