use crate::schema::recreate;
use skiff::{ConnectionSource, ConnectionUnit, Record, Value};

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Reading {
    #[skiff(key)]
    id: i64,
    label: Option<String>,
}

pub fn cursors<S: ConnectionSource>(source: &S) {
    recreate(
        source,
        "reading",
        "id BIGINT PRIMARY KEY, label VARCHAR(20)",
        None,
    );
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    for id in 1..=3 {
        unit.insert(&mut Reading {
            id,
            label: Some(format!("r{id}")),
        })
        .expect("Failed to insert a reading");
    }
    unit.commit_and_close().expect("Failed to commit the readings");

    // Rollback closes a partially consumed cursor
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let mut cursor = unit
        .query::<Reading>("where id > ? order by id", &[Value::Int64(Some(0)).into()])
        .expect("Failed to query the readings");
    assert_eq!(unit.open_cursors(), 1);
    let first = cursor.next().expect("Expected a first row").expect("Failed to read a row");
    let second = cursor.next().expect("Expected a second row").expect("Failed to read a row");
    assert_eq!((first.id, second.id), (1, 2));
    assert!(cursor.has_next());
    unit.rollback_and_close().expect("Failed to roll back");
    assert!(cursor.is_closed());
    assert!(!cursor.has_next());
    assert!(cursor.next().is_none());
    cursor.close();
    assert!(cursor.is_closed());

    // Exhaustion closes and deregisters
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let cursor = unit
        .query::<Reading>("where id <= 2", &[])
        .expect("Failed to query the readings");
    assert_eq!(cursor.count(), 2);
    assert_eq!(unit.open_cursors(), 0);

    // Several cursors on the same connection, seeing uncommitted writes
    let mut all = unit
        .query::<Reading>("select * from reading order by id", &[])
        .expect("Failed to query the readings");
    let mut labels = unit
        .query_arrays("select label from reading order by id desc", &[])
        .expect("Failed to query the labels");
    assert_eq!(unit.open_cursors(), 2);
    assert_eq!(
        all.next().and_then(Result::ok).map(|v| v.id),
        Some(1)
    );
    assert_eq!(
        labels.next().and_then(Result::ok),
        Some(vec![skiff::DriverValue::Text("r3".into())])
    );
    labels.close();
    labels.close();
    assert_eq!(unit.open_cursors(), 1);
    unit.insert(&mut Reading {
        id: 4,
        label: None,
    })
    .expect("Failed to insert a reading while a cursor is open");
    let count = unit
        .query_scalar("select count(*) from reading", &[])
        .expect("Failed to count the readings");
    assert_eq!(count.as_i64(), Some(4));

    // Breaking out of iteration leaves the cursor to the unit
    for reading in all.by_ref() {
        let reading = reading.expect("Failed to read a row");
        if reading.id == 2 {
            break;
        }
    }
    assert!(!all.is_closed());
    assert_eq!(unit.open_cursors(), 1);
    unit.rollback_and_close().expect("Failed to roll back");
    assert!(all.is_closed());
    assert!(all.next().is_none());

    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let count = unit
        .query_scalar("select count(*) from reading", &[])
        .expect("Failed to count the readings");
    assert_eq!(count.as_i64(), Some(3));
    unit.commit_and_close().expect("Failed to close the unit");
}
