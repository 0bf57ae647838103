use directory_core::db::open_db_in_memory;
use directory_core::{
    demo_seed_data, seed_directory, Activity, ActivityHierarchy, ActivityId, BoundingBox,
    Building, BuildingId, DirectoryStore, OrganizationId, OrganizationRecord, RepoResult,
    SqliteDirectoryStore, DEFAULT_MAX_DEPTH,
};
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};

fn seeded() -> Connection {
    let mut conn = open_db_in_memory().unwrap();
    seed_directory(&mut conn, &demo_seed_data()).unwrap();
    conn
}

fn ids(store: &SqliteDirectoryStore<'_>, names: &[&str]) -> BTreeSet<ActivityId> {
    names
        .iter()
        .map(|name| store.activity_by_name(name).unwrap().unwrap().id)
        .collect()
}

#[test]
fn default_depth_keeps_root_children_and_grandchildren() {
    let conn = seeded();
    let store = SqliteDirectoryStore::try_new(&conn).unwrap();
    let hierarchy = ActivityHierarchy::new(&store);
    assert_eq!(hierarchy.max_depth(), DEFAULT_MAX_DEPTH);

    let food = ids(&store, &["Food"]).into_iter().next().unwrap();
    let closure = hierarchy.closure(food).unwrap();

    assert_eq!(
        closure,
        ids(
            &store,
            &["Food", "Meat Products", "Dairy Products", "Cheese"]
        )
    );
    assert!(!closure.contains(&ids(&store, &["Artisan Cheese"]).into_iter().next().unwrap()));
}

#[test]
fn closure_from_inner_node_reaches_its_own_grandchildren() {
    let conn = seeded();
    let store = SqliteDirectoryStore::try_new(&conn).unwrap();
    let hierarchy = ActivityHierarchy::new(&store);

    let dairy = ids(&store, &["Dairy Products"]).into_iter().next().unwrap();
    assert_eq!(
        hierarchy.closure(dairy).unwrap(),
        ids(&store, &["Dairy Products", "Cheese", "Artisan Cheese"])
    );
}

#[test]
fn closure_is_idempotent() {
    let conn = seeded();
    let store = SqliteDirectoryStore::try_new(&conn).unwrap();
    let hierarchy = ActivityHierarchy::new(&store);
    let cars = ids(&store, &["Cars"]).into_iter().next().unwrap();

    let first = hierarchy.closure(cars).unwrap();
    let second = hierarchy.closure(cars).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 7);
}

#[test]
fn closure_of_unknown_root_is_just_the_root() {
    let conn = seeded();
    let store = SqliteDirectoryStore::try_new(&conn).unwrap();

    let closure = ActivityHierarchy::new(&store).closure(987_654).unwrap();
    assert_eq!(closure, BTreeSet::from([987_654]));
}

#[test]
fn closure_by_unknown_name_is_empty() {
    let conn = seeded();
    let store = SqliteDirectoryStore::try_new(&conn).unwrap();

    let closure = ActivityHierarchy::new(&store)
        .closure_by_name("Space Travel")
        .unwrap();
    assert!(closure.is_empty());
}

#[test]
fn closure_by_name_matches_closure_by_id() {
    let conn = seeded();
    let store = SqliteDirectoryStore::try_new(&conn).unwrap();
    let hierarchy = ActivityHierarchy::new(&store);
    let food = ids(&store, &["Food"]).into_iter().next().unwrap();

    assert_eq!(
        hierarchy.closure_by_name("Food").unwrap(),
        hierarchy.closure(food).unwrap()
    );
}

#[test]
fn custom_depth_controls_expansion() {
    let conn = seeded();
    let store = SqliteDirectoryStore::try_new(&conn).unwrap();
    let food = ids(&store, &["Food"]).into_iter().next().unwrap();

    let root_only = ActivityHierarchy::with_max_depth(&store, 1)
        .closure(food)
        .unwrap();
    assert_eq!(root_only, BTreeSet::from([food]));

    let zero = ActivityHierarchy::with_max_depth(&store, 0)
        .closure(food)
        .unwrap();
    assert_eq!(zero, BTreeSet::from([food]));

    let deep = ActivityHierarchy::with_max_depth(&store, 4)
        .closure(food)
        .unwrap();
    assert!(deep.is_superset(&ids(&store, &["Artisan Cheese"])));
}

/// Parent-map store used to drive the resolver without SQLite.
struct ParentMapStore {
    parents: BTreeMap<ActivityId, Option<ActivityId>>,
    child_queries: std::cell::Cell<u32>,
}

impl DirectoryStore for ParentMapStore {
    fn all_buildings(&self) -> RepoResult<Vec<Building>> {
        Ok(Vec::new())
    }

    fn organizations_by_building(&self, _: BuildingId) -> RepoResult<Vec<OrganizationRecord>> {
        Ok(Vec::new())
    }

    fn organizations_by_name_substring(&self, _: &str) -> RepoResult<Vec<OrganizationRecord>> {
        Ok(Vec::new())
    }

    fn organizations_by_activity_ids(
        &self,
        _: &BTreeSet<ActivityId>,
    ) -> RepoResult<Vec<OrganizationRecord>> {
        Ok(Vec::new())
    }

    fn organization_by_id(&self, _: OrganizationId) -> RepoResult<Option<OrganizationRecord>> {
        Ok(None)
    }

    fn activity_by_name(&self, name: &str) -> RepoResult<Option<Activity>> {
        Ok(name.parse::<ActivityId>().ok().map(|id| Activity {
            id,
            name: name.to_string(),
            parent_id: self.parents.get(&id).copied().flatten(),
        }))
    }

    fn child_activity_ids(
        &self,
        parent_ids: &BTreeSet<ActivityId>,
    ) -> RepoResult<BTreeSet<ActivityId>> {
        self.child_queries.set(self.child_queries.get() + 1);
        Ok(self
            .parents
            .iter()
            .filter(|(_, parent)| parent.is_some_and(|p| parent_ids.contains(&p)))
            .map(|(id, _)| *id)
            .collect())
    }

    fn all_organizations_with_buildings(&self) -> RepoResult<Vec<OrganizationRecord>> {
        Ok(Vec::new())
    }

    fn organizations_in_bbox(&self, _: &BoundingBox) -> RepoResult<Vec<OrganizationRecord>> {
        Ok(Vec::new())
    }
}

#[test]
fn parent_cycle_is_bounded_by_depth() {
    let store = ParentMapStore {
        parents: BTreeMap::from([(1, Some(3)), (2, Some(1)), (3, Some(2))]),
        child_queries: std::cell::Cell::new(0),
    };

    let closure = ActivityHierarchy::new(&store).closure(1).unwrap();
    assert_eq!(closure, BTreeSet::from([1, 2, 3]));
    assert_eq!(store.child_queries.get(), DEFAULT_MAX_DEPTH - 1);
}

#[test]
fn expansion_stops_early_when_frontier_empties() {
    let store = ParentMapStore {
        parents: BTreeMap::from([(1, None), (2, Some(1))]),
        child_queries: std::cell::Cell::new(0),
    };

    let closure = ActivityHierarchy::with_max_depth(&store, 10)
        .closure_by_name("1")
        .unwrap();
    assert_eq!(closure, BTreeSet::from([1, 2]));
    assert_eq!(store.child_queries.get(), 2);
}
