use crate::schema::recreate;
use skiff::{ConnectionSource, ConnectionUnit, Error, Record, Value};

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Department {
    #[skiff(sequence = "department_seq")]
    id: Option<i64>,
    name: String,
    budget: Option<i32>,
}

pub fn departments<S: ConnectionSource>(source: &S) {
    recreate(
        source,
        "department",
        "id {key}, name VARCHAR(100) NOT NULL, budget INTEGER",
        Some("department_seq"),
    );

    // Generated keys
    let mut research = Department {
        name: "Research".into(),
        budget: Some(1000),
        ..Default::default()
    };
    let mut operations = Department {
        name: "Operations".into(),
        ..Default::default()
    };
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    assert_eq!(unit.insert(&mut research).expect("Failed to insert research"), 1);
    assert_eq!(
        unit.insert(&mut operations).expect("Failed to insert operations"),
        1
    );
    let research_id = research.id.expect("The key of research was not generated");
    let operations_id = operations.id.expect("The key of operations was not generated");
    assert!(operations_id > research_id);
    let same: Department = unit.get(research_id).expect("Failed to get research");
    assert_eq!(same, research);
    unit.commit_and_close().expect("Failed to commit the inserts");

    // Insert, update twice, commit, a fresh unit sees the final values
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let mut legal = Department {
        name: "Legal".into(),
        budget: Some(10),
        ..Default::default()
    };
    unit.insert(&mut legal).expect("Failed to insert legal");
    legal.budget = Some(20);
    unit.update(&legal).expect("Failed to update legal");
    legal.name = "Legal & Compliance".into();
    legal.budget = None;
    unit.update(&legal).expect("Failed to update legal again");
    unit.commit_and_close().expect("Failed to commit legal");
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let loaded: Department = unit
        .get(legal.id.expect("The key of legal was not generated"))
        .expect("Failed to get legal");
    assert_eq!(loaded.name, "Legal & Compliance");
    assert_eq!(loaded.budget, None);
    assert_eq!(loaded, legal);

    // Missing keys
    let ghost = Department {
        id: Some(research_id + 10_000),
        name: "Ghost".into(),
        budget: None,
    };
    assert!(matches!(unit.update(&ghost), Err(Error::NotFound { .. })));
    assert!(matches!(unit.delete(&ghost), Err(Error::NotFound { .. })));
    assert!(matches!(
        unit.get::<Department>(research_id + 10_000),
        Err(Error::NotFound { .. })
    ));
    assert_eq!(
        unit.find::<Department>(research_id + 10_000)
            .expect("Failed to look for a missing department"),
        None
    );

    // Predicate queries
    let listed = unit
        .query::<Department>("where budget is null order by id", &[])
        .expect("Failed to query departments without budget")
        .collect::<Result<Vec<_>, _>>()
        .expect("Failed to read departments without budget");
    assert_eq!(listed, [operations.clone(), legal.clone()]);
    let named: Department = unit
        .query_one(
            "select * from department where name = ?",
            &[Value::Text(Some("Operations".into())).into()],
        )
        .expect("Failed to query operations by name");
    assert_eq!(named, operations);
    assert!(matches!(
        unit.query_one::<Department>("where id > ?", &[Value::Int64(Some(0)).into()]),
        Err(Error::MultipleRows { .. })
    ));
    assert_eq!(unit.open_cursors(), 0);

    // Deletes
    unit.delete(&operations).expect("Failed to delete operations");
    unit.delete_by_key::<Department>(&[Value::Int64(legal.id)])
        .expect("Failed to delete legal by key");
    let count = unit
        .query_scalar("select count(*) from department", &[])
        .expect("Failed to count departments");
    assert_eq!(count.as_i64(), Some(1));
    unit.rollback_and_close()
        .expect("Failed to roll back the deletes");
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let count = unit
        .query_scalar("select count(*) from department", &[])
        .expect("Failed to count departments");
    assert_eq!(count.as_i64(), Some(3));
    unit.commit_and_close().expect("Failed to close the unit");
}
