//! Directory entity store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup and filter primitives over buildings, activities,
//!   organizations, phones and the organization/activity association.
//! - Hydrate organization rows into `OrganizationRecord` read models.
//!
//! # Invariants
//! - Every returned organization carries its resolved building; a dangling
//!   `building_id` is reported as invalid data, never dropped.
//! - Organization lists are ordered by `organizations.id ASC` with no
//!   duplicates, even when several matching activities link the same row.
//! - Phones are ordered by phone row id; activities and children by id.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::geo::BoundingBox;
use crate::model::activity::{Activity, ActivityId, ActivityNode};
use crate::model::building::{Building, BuildingId};
use crate::model::organization::{Organization, OrganizationId, OrganizationRecord};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ORGANIZATION_SELECT_SQL: &str = "SELECT
    o.id AS org_id,
    o.name AS org_name,
    o.building_id AS org_building_id,
    b.id AS building_id,
    b.address AS building_address,
    b.latitude AS building_latitude,
    b.longitude AS building_longitude
FROM organizations o
LEFT JOIN buildings b ON b.id = o.building_id";

/// Max ids bound into one `IN (...)` list.
const MAX_IN_LIST_LEN: usize = 500;

const REQUIRED_TABLES: &[&str] = &[
    "buildings",
    "activities",
    "organizations",
    "organization_phone_numbers",
    "organization_activities",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from directory store reads.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Persisted rows cannot be converted into a valid read model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid directory data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "directory store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "directory store requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read-only data access contract consumed by directory services.
pub trait DirectoryStore {
    /// Lists every building ordered by id.
    fn all_buildings(&self) -> RepoResult<Vec<Building>>;
    /// Lists organizations hosted by one building.
    fn organizations_by_building(
        &self,
        building_id: BuildingId,
    ) -> RepoResult<Vec<OrganizationRecord>>;
    /// Case-insensitive substring match on organization name.
    ///
    /// An empty pattern matches every organization.
    fn organizations_by_name_substring(&self, pattern: &str)
        -> RepoResult<Vec<OrganizationRecord>>;
    /// Organizations linked to at least one activity in `activity_ids`.
    fn organizations_by_activity_ids(
        &self,
        activity_ids: &BTreeSet<ActivityId>,
    ) -> RepoResult<Vec<OrganizationRecord>>;
    /// Loads one organization, `None` when absent.
    fn organization_by_id(&self, id: OrganizationId) -> RepoResult<Option<OrganizationRecord>>;
    /// Exact-name activity lookup.
    fn activity_by_name(&self, name: &str) -> RepoResult<Option<Activity>>;
    /// Ids of every activity whose parent is in `parent_ids`.
    fn child_activity_ids(
        &self,
        parent_ids: &BTreeSet<ActivityId>,
    ) -> RepoResult<BTreeSet<ActivityId>>;
    /// Every organization with its building, for in-process geo scans.
    fn all_organizations_with_buildings(&self) -> RepoResult<Vec<OrganizationRecord>>;
    /// Organizations whose building lies inside `bbox`, evaluated in storage.
    fn organizations_in_bbox(&self, bbox: &BoundingBox) -> RepoResult<Vec<OrganizationRecord>>;
}

/// SQLite-backed directory store.
///
/// Borrows a caller-owned connection; the caller controls its lifetime.
pub struct SqliteDirectoryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DirectoryStore for SqliteDirectoryStore<'_> {
    fn all_buildings(&self) -> RepoResult<Vec<Building>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, address, latitude, longitude
             FROM buildings
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut buildings = Vec::new();
        while let Some(row) = rows.next()? {
            buildings.push(Building {
                id: row.get("id")?,
                address: row.get("address")?,
                latitude: row.get("latitude")?,
                longitude: row.get("longitude")?,
            });
        }
        Ok(buildings)
    }

    fn organizations_by_building(
        &self,
        building_id: BuildingId,
    ) -> RepoResult<Vec<OrganizationRecord>> {
        let rows = load_organization_rows(
            self.conn,
            &format!("{ORGANIZATION_SELECT_SQL} WHERE o.building_id = ? ORDER BY o.id ASC;"),
            vec![Value::Integer(building_id)],
        )?;
        hydrate_records(self.conn, rows)
    }

    fn organizations_by_name_substring(
        &self,
        pattern: &str,
    ) -> RepoResult<Vec<OrganizationRecord>> {
        // SQLite `LIKE` and `lower()` fold ASCII only; names are matched here
        // so Cyrillic and other scripts compare case-insensitively too.
        let needle = pattern.to_lowercase();
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM organizations ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut matched = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            if name.to_lowercase().contains(needle.as_str()) {
                matched.push(row.get::<_, OrganizationId>("id")?);
            }
        }
        load_records_by_ids(self.conn, &matched)
    }

    fn organizations_by_activity_ids(
        &self,
        activity_ids: &BTreeSet<ActivityId>,
    ) -> RepoResult<Vec<OrganizationRecord>> {
        let activity_ids = activity_ids.iter().copied().collect::<Vec<_>>();
        let mut organization_ids = BTreeSet::new();
        for chunk in activity_ids.chunks(MAX_IN_LIST_LEN) {
            let sql = format!(
                "SELECT DISTINCT organization_id
                 FROM organization_activities
                 WHERE activity_id IN ({});",
                placeholders(chunk.len())
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                organization_ids.insert(row.get::<_, OrganizationId>(0)?);
            }
        }

        let organization_ids = organization_ids.into_iter().collect::<Vec<_>>();
        load_records_by_ids(self.conn, &organization_ids)
    }

    fn organization_by_id(&self, id: OrganizationId) -> RepoResult<Option<OrganizationRecord>> {
        let mut records = load_records_by_ids(self.conn, &[id])?;
        Ok(records.pop())
    }

    fn activity_by_name(&self, name: &str) -> RepoResult<Option<Activity>> {
        let activity = self
            .conn
            .query_row(
                "SELECT id, name, parent_id
                 FROM activities
                 WHERE name = ?1;",
                [name],
                parse_activity_row,
            )
            .optional()?;
        Ok(activity)
    }

    fn child_activity_ids(
        &self,
        parent_ids: &BTreeSet<ActivityId>,
    ) -> RepoResult<BTreeSet<ActivityId>> {
        let children = list_children_of(self.conn, parent_ids)?;
        Ok(children.into_iter().map(|child| child.id).collect())
    }

    fn all_organizations_with_buildings(&self) -> RepoResult<Vec<OrganizationRecord>> {
        let rows = load_organization_rows(
            self.conn,
            &format!("{ORGANIZATION_SELECT_SQL} ORDER BY o.id ASC;"),
            Vec::new(),
        )?;
        hydrate_records(self.conn, rows)
    }

    fn organizations_in_bbox(&self, bbox: &BoundingBox) -> RepoResult<Vec<OrganizationRecord>> {
        let rows = load_organization_rows(
            self.conn,
            &format!(
                "{ORGANIZATION_SELECT_SQL}
                 WHERE b.latitude BETWEEN ? AND ?
                   AND b.longitude BETWEEN ? AND ?
                 ORDER BY o.id ASC;"
            ),
            vec![
                Value::Real(bbox.lat_min),
                Value::Real(bbox.lat_max),
                Value::Real(bbox.lon_min),
                Value::Real(bbox.lon_max),
            ],
        )?;
        hydrate_records(self.conn, rows)
    }
}

fn load_records_by_ids(
    conn: &Connection,
    ids: &[OrganizationId],
) -> RepoResult<Vec<OrganizationRecord>> {
    let mut rows = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(MAX_IN_LIST_LEN) {
        let sql = format!(
            "{ORGANIZATION_SELECT_SQL} WHERE o.id IN ({}) ORDER BY o.id ASC;",
            placeholders(chunk.len())
        );
        let binds = chunk.iter().copied().map(Value::Integer).collect();
        rows.extend(load_organization_rows(conn, &sql, binds)?);
    }
    rows.sort_by_key(|(organization, _)| organization.id);
    hydrate_records(conn, rows)
}

fn load_organization_rows(
    conn: &Connection,
    sql: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<(Organization, Building)>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_organization_row(row)?);
    }
    Ok(items)
}

fn parse_organization_row(row: &Row<'_>) -> RepoResult<(Organization, Building)> {
    let organization = Organization {
        id: row.get("org_id")?,
        name: row.get("org_name")?,
        building_id: row.get("org_building_id")?,
    };

    let Some(building_id) = row.get::<_, Option<BuildingId>>("building_id")? else {
        return Err(RepoError::InvalidData(format!(
            "organization {} references missing building {}",
            organization.id, organization.building_id
        )));
    };

    let building = Building {
        id: building_id,
        address: row.get("building_address")?,
        latitude: row.get("building_latitude")?,
        longitude: row.get("building_longitude")?,
    };
    Ok((organization, building))
}

fn hydrate_records(
    conn: &Connection,
    rows: Vec<(Organization, Building)>,
) -> RepoResult<Vec<OrganizationRecord>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let organization_ids = rows
        .iter()
        .map(|(organization, _)| organization.id)
        .collect::<Vec<_>>();
    let mut phones = load_phone_numbers(conn, &organization_ids)?;
    let mut links = load_activity_links(conn, &organization_ids)?;

    let linked_ids = links
        .values()
        .flatten()
        .map(|activity| activity.id)
        .collect::<BTreeSet<_>>();
    let mut children_by_parent: BTreeMap<ActivityId, Vec<Activity>> = BTreeMap::new();
    for child in list_children_of(conn, &linked_ids)? {
        if let Some(parent_id) = child.parent_id {
            children_by_parent.entry(parent_id).or_default().push(child);
        }
    }

    let records = rows
        .into_iter()
        .map(|(organization, building)| {
            let activities = links
                .remove(&organization.id)
                .unwrap_or_default()
                .into_iter()
                .map(|activity| ActivityNode {
                    children: children_by_parent
                        .get(&activity.id)
                        .cloned()
                        .unwrap_or_default(),
                    activity,
                })
                .collect();
            OrganizationRecord {
                phone_numbers: phones.remove(&organization.id).unwrap_or_default(),
                activities,
                organization,
                building,
            }
        })
        .collect();
    Ok(records)
}

fn load_phone_numbers(
    conn: &Connection,
    organization_ids: &[OrganizationId],
) -> RepoResult<BTreeMap<OrganizationId, Vec<String>>> {
    let mut phones: BTreeMap<OrganizationId, Vec<String>> = BTreeMap::new();
    for chunk in organization_ids.chunks(MAX_IN_LIST_LEN) {
        let sql = format!(
            "SELECT organization_id, phone_number
             FROM organization_phone_numbers
             WHERE organization_id IN ({})
             ORDER BY id ASC;",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            phones
                .entry(row.get("organization_id")?)
                .or_default()
                .push(row.get("phone_number")?);
        }
    }
    Ok(phones)
}

fn load_activity_links(
    conn: &Connection,
    organization_ids: &[OrganizationId],
) -> RepoResult<BTreeMap<OrganizationId, Vec<Activity>>> {
    let mut links: BTreeMap<OrganizationId, Vec<Activity>> = BTreeMap::new();
    for chunk in organization_ids.chunks(MAX_IN_LIST_LEN) {
        let sql = format!(
            "SELECT
                oa.organization_id AS organization_id,
                a.id AS id,
                a.name AS name,
                a.parent_id AS parent_id
             FROM organization_activities oa
             INNER JOIN activities a ON a.id = oa.activity_id
             WHERE oa.organization_id IN ({})
             ORDER BY oa.organization_id ASC, a.id ASC;",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            let organization_id: OrganizationId = row.get("organization_id")?;
            links
                .entry(organization_id)
                .or_default()
                .push(parse_activity_row(row)?);
        }
    }
    Ok(links)
}

fn list_children_of(
    conn: &Connection,
    parent_ids: &BTreeSet<ActivityId>,
) -> RepoResult<Vec<Activity>> {
    let parent_ids = parent_ids.iter().copied().collect::<Vec<_>>();
    let mut children = Vec::new();
    for chunk in parent_ids.chunks(MAX_IN_LIST_LEN) {
        let sql = format!(
            "SELECT id, name, parent_id
             FROM activities
             WHERE parent_id IN ({})
             ORDER BY id ASC;",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
        while let Some(row) = rows.next()? {
            children.push(parse_activity_row(row)?);
        }
    }
    children.sort_by_key(|child| child.id);
    Ok(children)
}

fn parse_activity_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get("id")?,
        name: row.get("name")?,
        parent_id: row.get("parent_id")?,
    })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES.iter().copied() {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
