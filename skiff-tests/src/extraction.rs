use crate::schema::recreate;
use skiff::{
    ConnectionSource, ConnectionUnit, DriverValue, Error, QueryOptions, RawMap, Record, Value,
};

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Contact {
    #[skiff(key)]
    id: i64,
    name: String,
    email: Option<String>,
}

pub fn extraction<S: ConnectionSource>(source: &S) {
    recreate(
        source,
        "contact",
        "id BIGINT PRIMARY KEY, name VARCHAR(50) NOT NULL, email VARCHAR(100)",
        None,
    );
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let mut ada = Contact {
        id: 1,
        name: "Ada".into(),
        email: Some("ada@example.com".into()),
    };
    let mut alan = Contact {
        id: 2,
        name: "Alan".into(),
        email: None,
    };
    unit.insert(&mut ada).expect("Failed to insert ada");
    unit.insert(&mut alan).expect("Failed to insert alan");

    // Strict extraction requires every column
    let mut strict = unit
        .query::<Contact>("select id, name from contact order by id", &[])
        .expect("Failed to query the contacts");
    assert!(matches!(
        strict.next(),
        Some(Err(Error::MissingColumn { column })) if column == "email"
    ));
    drop(strict);

    // Tolerant extraction leaves missing attributes unset
    let partial = unit
        .query_with::<Contact>(
            "select id, name from contact order by id",
            &[],
            QueryOptions::tolerant(),
        )
        .expect("Failed to query the contacts")
        .collect::<Result<Vec<_>, _>>()
        .expect("Failed to read the contacts");
    assert_eq!(
        partial,
        [
            Contact {
                email: None,
                ..ada.clone()
            },
            alan.clone()
        ]
    );

    // Column labels match ignoring ASCII case
    let upper: Contact = unit
        .query_one(
            "select EMAIL, NAME, ID from contact where id = ?",
            &[Value::Int64(Some(1)).into()],
        )
        .expect("Failed to query ada with upper case labels");
    assert_eq!(upper, ada);

    // Raw targets
    let maps = unit
        .query_maps("select id, name, email from contact order by id", &[])
        .expect("Failed to query the raw contacts")
        .collect::<Result<Vec<RawMap>, _>>()
        .expect("Failed to read the raw contacts");
    assert_eq!(maps.len(), 2);
    assert_eq!(maps[0]["name"], DriverValue::Text("Ada".into()));
    assert_eq!(maps[1]["email"], DriverValue::Null);
    assert_eq!(maps[1]["id"].as_i64(), Some(2));
    let arrays = unit
        .query_arrays(
            "select name, email from contact where id = ?",
            &[Value::Int64(Some(2)).into()],
        )
        .expect("Failed to query the raw alan")
        .collect::<Result<Vec<_>, _>>()
        .expect("Failed to read the raw alan");
    assert_eq!(
        arrays,
        [vec![DriverValue::Text("Alan".into()), DriverValue::Null]]
    );

    // Scalars need exactly one row
    assert!(matches!(
        unit.query_scalar("select name from contact where id < 0", &[]),
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        unit.query_scalar("select name from contact", &[]),
        Err(Error::MultipleRows { .. })
    ));
    assert_eq!(unit.open_cursors(), 0);
    unit.commit_and_close().expect("Failed to commit the contacts");
}
