use crate::{schema::recreate, silent_logs};
use skiff::{ConnectionSource, ConnectionUnit, DriverValue, Error, Record, Result, Value};

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[skiff(table = "ledger")]
struct Entry {
    #[skiff(key)]
    id: i64,
    amount: i64,
}

fn count<S: ConnectionSource>(source: &S) -> i64 {
    ConnectionUnit::run(source, |unit| {
        unit.query_scalar("select count(*) from ledger", &[])
    })
    .expect("Failed to count the entries")
    .as_i64()
    .expect("The count is not an integer")
}

pub fn units<S: ConnectionSource>(source: &S) {
    recreate(
        source,
        "ledger",
        "id BIGINT PRIMARY KEY, amount BIGINT NOT NULL",
        None,
    );

    // Success commits
    let inserted = ConnectionUnit::run(source, |unit| -> Result<u64> {
        let mut total = 0;
        for id in 1..=2 {
            total += unit.insert(&mut Entry { id, amount: 100 })?;
        }
        Ok(total)
    })
    .expect("Failed to insert the entries");
    assert_eq!(inserted, 2);
    assert_eq!(count(source), 2);

    // A domain error rolls back and passes through
    let result = ConnectionUnit::run(source, |unit| -> Result<()> {
        unit.insert(&mut Entry { id: 3, amount: 5 })?;
        unit.update(&Entry { id: 99, amount: 5 })?;
        Ok(())
    });
    assert!(matches!(result, Err(Error::NotFound { .. })));
    assert_eq!(count(source), 2);

    // A driver error is wrapped with the statement that caused it
    let result = silent_logs! {
        ConnectionUnit::run(source, |unit| {
            unit.execute(
                "update ledger set amount = ? where no_such_column = 1",
                &[Value::Int64(Some(7)).into()],
            )
        })
    };
    let Err(Error::DatabaseError { sql, params, .. }) = result else {
        panic!("Expected a database error, got {result:?}");
    };
    assert_eq!(sql, "update ledger set amount = ? where no_such_column = 1");
    assert_eq!(params, [DriverValue::Int64(7)]);

    // A duplicate key fails at the database, the unit is rolled back by the caller
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    unit.insert(&mut Entry { id: 10, amount: 1 })
        .expect("Failed to insert an entry");
    let duplicate = silent_logs! {
        unit.insert(&mut Entry { id: 1, amount: 1 })
    };
    let error = unit.rollback_close_and_wrap(
        duplicate.expect_err("Inserting a duplicate key should fail"),
    );
    assert!(matches!(error, Error::DatabaseError { .. }));
    assert!(unit.is_closed());
    assert!(matches!(unit.get::<Entry>(1i64), Err(Error::Closed)));
    assert!(matches!(unit.commit_and_close(), Err(Error::Closed)));
    assert_eq!(count(source), 2);

    // Dropping an open unit rolls it back
    silent_logs! {
        let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
        unit.delete_by_key::<Entry>(&[Value::Int64(Some(1))])
            .expect("Failed to delete an entry");
        drop(unit);
    }
    assert_eq!(count(source), 2);
}
