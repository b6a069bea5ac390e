use basin_core::{
    compile_conditions, Entity, EntityRepository, EntityService, FieldAccessor, FieldKind,
    FieldValue, MemoryRepository, Metadata, Query, QueryCondition, QueryError, QueryOperator,
    Queryable, ServiceError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Information,
    Warning,
    Error,
}

impl Severity {
    fn token(self) -> &'static str {
        match self {
            Self::Information => "information",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    fn ordinal(self) -> i64 {
        match self {
            Self::Information => 0,
            Self::Warning => 1,
            Self::Error => 2,
        }
    }
}

#[derive(Debug, Clone)]
struct LogEntry {
    id: i64,
    level: Severity,
    source: String,
    tags: Vec<String>,
    metadata: Metadata,
}

impl LogEntry {
    fn new(id: i64, level: Severity, source: &str, tags: &[&str]) -> Self {
        Self {
            id,
            level,
            source: source.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            metadata: Metadata::new(),
        }
    }
}

impl Entity for LogEntry {
    type Id = i64;

    fn id(&self) -> &i64 {
        &self.id
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

fn id_field(entry: &LogEntry) -> FieldValue {
    FieldValue::Integer(entry.id)
}

fn level_field(entry: &LogEntry) -> FieldValue {
    FieldValue::symbol(entry.level.token(), entry.level.ordinal())
}

fn source_field(entry: &LogEntry) -> FieldValue {
    FieldValue::Text(entry.source.clone())
}

fn tags_field(entry: &LogEntry) -> FieldValue {
    FieldValue::TextList(entry.tags.clone())
}

impl Queryable for LogEntry {
    fn schema() -> &'static [FieldAccessor<Self>] {
        const SCHEMA: &[FieldAccessor<LogEntry>] = &[
            FieldAccessor {
                name: "id",
                kind: FieldKind::Integer,
                get: id_field,
            },
            FieldAccessor {
                name: "level",
                kind: FieldKind::Symbol,
                get: level_field,
            },
            FieldAccessor {
                name: "source",
                kind: FieldKind::Text,
                get: source_field,
            },
            FieldAccessor {
                name: "tags",
                kind: FieldKind::TextList,
                get: tags_field,
            },
        ];
        SCHEMA
    }
}

fn populated_service() -> EntityService<LogEntry> {
    let repo = MemoryRepository::new();
    let entries = [
        LogEntry::new(1, Severity::Error, "ingest", &["disk"]),
        LogEntry::new(2, Severity::Error, "ingest", &["net"]),
        LogEntry::new(3, Severity::Information, "scheduler", &[]),
        LogEntry::new(4, Severity::Error, "scheduler", &["disk", "retry"]),
        LogEntry::new(5, Severity::Information, "ingest", &[]),
    ];
    for entry in &entries {
        repo.add(entry, None).unwrap();
    }
    EntityService::new(Box::new(repo))
}

#[test]
fn equality_on_enumeration_matches_exactly_the_error_entries() {
    let service = populated_service();
    let found = service
        .find(
            &[QueryCondition::new(
                "level",
                QueryOperator::Equal,
                FieldValue::symbol("error", Severity::Error.ordinal()),
            )],
            None,
        )
        .unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|entry| entry.level == Severity::Error));
}

#[test]
fn equality_accepts_the_bare_token() {
    let service = populated_service();
    let found = service
        .find(
            &[QueryCondition::new(
                "level",
                QueryOperator::Equal,
                FieldValue::text("error"),
            )],
            None,
        )
        .unwrap();
    assert_eq!(found.len(), 3);
}

#[test]
fn ordering_on_enumeration_compares_the_ordinal() {
    let service = populated_service();
    let found = service
        .find(
            &[QueryCondition::new(
                "level",
                QueryOperator::GreaterThan,
                FieldValue::symbol("information", Severity::Information.ordinal()),
            )],
            None,
        )
        .unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|entry| entry.level == Severity::Error));
}

#[test]
fn conditions_combine_conjunctively() {
    let service = populated_service();
    let found = service
        .find(
            &[
                QueryCondition::new("level", QueryOperator::Equal, FieldValue::text("error")),
                QueryCondition::new("source", QueryOperator::Equal, FieldValue::text("ingest")),
            ],
            None,
        )
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn contains_filters_collection_valued_fields() {
    let service = populated_service();
    let found = service
        .find(
            &[QueryCondition::new(
                "tags",
                QueryOperator::Contains,
                FieldValue::text("disk"),
            )],
            None,
        )
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn empty_condition_list_returns_every_entity() {
    let service = populated_service();
    let found = service.find(&[], None).unwrap();
    assert_eq!(found.len(), 5);
}

#[test]
fn unknown_field_fails_instead_of_returning_an_empty_set() {
    let service = populated_service();
    let err = service
        .find(
            &[QueryCondition::new(
                "severity_level",
                QueryOperator::Equal,
                FieldValue::text("error"),
            )],
            None,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Query(QueryError::UnknownField { field }) if field == "severity_level"
    ));
}

#[test]
fn compiled_query_is_reusable_across_scans() {
    let compiled = compile_conditions::<LogEntry>(&[QueryCondition::new(
        "level",
        QueryOperator::GreaterThanOrEqual,
        FieldValue::Integer(Severity::Error.ordinal()),
    )])
    .unwrap();

    let repo = MemoryRepository::new();
    repo.add(&LogEntry::new(1, Severity::Error, "a", &[]), None)
        .unwrap();
    repo.add(&LogEntry::new(2, Severity::Information, "b", &[]), None)
        .unwrap();

    let first = repo
        .get_matching(&|entry| compiled.matches(entry), None)
        .unwrap();
    assert_eq!(first.len(), 1);

    repo.add(&LogEntry::new(3, Severity::Error, "c", &[]), None)
        .unwrap();
    let second = repo
        .get_matching(&|entry| compiled.matches(entry), None)
        .unwrap();
    assert_eq!(second.len(), 2);
}

#[test]
fn query_builder_compiles_to_the_same_predicate() {
    let query = Query::<LogEntry>::new()
        .and(QueryCondition::new(
            "level",
            QueryOperator::Equal,
            FieldValue::text("error"),
        ))
        .and(QueryCondition::new(
            "tags",
            QueryOperator::Contains,
            FieldValue::text("disk"),
        ));
    let compiled = query.compile().unwrap();

    assert!(compiled.matches(&LogEntry::new(1, Severity::Error, "ingest", &["disk"])));
    assert!(!compiled.matches(&LogEntry::new(2, Severity::Error, "ingest", &["net"])));
    assert!(!compiled.matches(&LogEntry::new(3, Severity::Information, "ingest", &["disk"])));
}

#[test]
fn remove_where_deletes_matches_and_reports_count() {
    let service = populated_service();
    let removed = service
        .remove_where(
            &[QueryCondition::new(
                "level",
                QueryOperator::Equal,
                FieldValue::text("error"),
            )],
            None,
        )
        .unwrap();
    assert_eq!(removed, 3);
    assert_eq!(service.count(None).unwrap(), 2);

    let removed = service
        .remove_where(
            &[QueryCondition::new(
                "level",
                QueryOperator::Equal,
                FieldValue::text("error"),
            )],
            None,
        )
        .unwrap();
    assert_eq!(removed, 0);
}
