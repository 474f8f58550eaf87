use crate::schema::recreate;
use rust_decimal::Decimal;
use skiff::{
    ConnectionSource, ConnectionUnit, Day, Dialect, DriverValue, Enumeration, Hour, Millisecond,
    Minute, Parameter, Record, Second, Value,
};
use std::{
    fmt::Debug,
    str::FromStr,
    time::{Duration, SystemTime},
};
use time::{Date, OffsetDateTime, PrimitiveDateTime, macros::datetime};

#[derive(Debug, Default, Clone, Copy, PartialEq, Enumeration)]
enum Shade {
    #[default]
    Light,
    Dark,
    #[skiff(name = "ULTRA_VIOLET")]
    UltraViolet,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[skiff(table = "kinds")]
struct Kinds {
    #[skiff(key)]
    id: i64,
    text: Option<String>,
    int32: Option<i32>,
    int64: Option<i64>,
    decimal: Option<Decimal>,
    boolean: Option<bool>,
    legacy: Option<SystemTime>,
    day: Option<Day>,
    hour: Option<Hour>,
    minute: Option<Minute>,
    second: Option<Second>,
    millisecond: Option<Millisecond>,
    zoned: Option<OffsetDateTime>,
    local_date: Option<Date>,
    local_date_time: Option<PrimitiveDateTime>,
    #[skiff(enumeration)]
    shade: Option<Shade>,
    bytes: Option<Vec<u8>>,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[skiff(table = "stamped_kinds")]
struct StampedKinds {
    #[skiff(key)]
    id: i64,
    #[skiff(timestamp)]
    day: Option<Day>,
    #[skiff(timestamp)]
    hour: Option<Hour>,
    #[skiff(timestamp)]
    minute: Option<Minute>,
    #[skiff(timestamp)]
    second: Option<Second>,
    #[skiff(timestamp)]
    millisecond: Option<Millisecond>,
    #[skiff(timestamp)]
    local_date: Option<Date>,
    #[skiff(timestamp)]
    local_date_time: Option<PrimitiveDateTime>,
}

fn round_trip<S, R>(source: &S, records: &[R])
where
    S: ConnectionSource,
    R: Record + Clone + PartialEq + Debug,
{
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    for record in records {
        unit.insert(&mut record.clone())
            .unwrap_or_else(|e| panic!("Failed to insert {record:?}: {e}"));
    }
    unit.commit_and_close().expect("Failed to commit the inserts");
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let loaded = unit
        .query::<R>("where id > ? order by id", &[Value::Int64(Some(0)).into()])
        .expect("Failed to query the records")
        .collect::<Result<Vec<_>, _>>()
        .expect("Failed to read the records");
    assert_eq!(loaded, records);
    unit.commit_and_close().expect("Failed to close the unit");
}

pub fn kinds<S: ConnectionSource>(source: &S) {
    recreate(
        source,
        "kinds",
        "id BIGINT PRIMARY KEY, text VARCHAR(200), int32 INTEGER, int64 BIGINT, \
         decimal {decimal}, boolean {boolean}, legacy {timestamp}, day VARCHAR(40), \
         hour VARCHAR(40), minute VARCHAR(40), second VARCHAR(40), millisecond VARCHAR(40), \
         zoned {timestamptz}, local_date VARCHAR(40), local_date_time VARCHAR(40), \
         shade VARCHAR(20), bytes {blob}",
        None,
    );
    recreate(
        source,
        "stamped_kinds",
        "id BIGINT PRIMARY KEY, day {timestamp}, hour {timestamp}, minute {timestamp}, \
         second {timestamp}, millisecond {timestamp}, local_date {timestamp}, \
         local_date_time {timestamp}",
        None,
    );
    let moment = datetime!(2024-03-05 14:30:15.123456789);
    let filled = Kinds {
        id: 1,
        text: Some("O'Brien says \"hi\"".into()),
        int32: Some(i32::MIN),
        int64: Some(i64::MAX),
        decimal: Some(Decimal::from_str("-1234.567891").expect("Invalid decimal")),
        boolean: Some(true),
        legacy: Some(SystemTime::UNIX_EPOCH + Duration::from_micros(1_709_649_015_123_456)),
        day: Some(Day::new(moment)),
        hour: Some(Hour::new(moment)),
        minute: Some(Minute::new(moment)),
        second: Some(Second::new(moment)),
        millisecond: Some(Millisecond::new(moment)),
        zoned: Some(datetime!(2024-03-05 14:30:15.5 +02:00)),
        local_date: Some(moment.date()),
        local_date_time: Some(moment),
        shade: Some(Shade::UltraViolet),
        bytes: Some(vec![0, 159, 146, 150, 255]),
    };
    let falsy = Kinds {
        id: 2,
        text: Some(String::new()),
        int32: Some(0),
        int64: Some(-1),
        decimal: Some(Decimal::ZERO),
        boolean: Some(false),
        shade: Some(Shade::Light),
        bytes: Some(Vec::new()),
        ..Default::default()
    };
    let empty = Kinds {
        id: 3,
        ..Default::default()
    };
    round_trip(source, &[filled, falsy, empty]);

    let stamped = StampedKinds {
        id: 1,
        day: Some(Day::new(moment)),
        hour: Some(Hour::new(moment)),
        minute: Some(Minute::new(moment)),
        second: Some(Second::new(moment)),
        millisecond: Some(Millisecond::new(moment)),
        local_date: Some(moment.date()),
        local_date_time: Some(moment),
    };
    round_trip(source, &[stamped, StampedKinds { id: 2, ..Default::default() }]);

    // Granularities land as canonical text unless stored as timestamps
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let hour = unit
        .query_scalar("select hour from kinds where id = 1", &[])
        .expect("Failed to read the hour");
    assert_eq!(hour, DriverValue::Text("2024-03-05T14".into()));
    let shade = unit
        .query_scalar("select shade from kinds where id = 1", &[])
        .expect("Failed to read the shade");
    assert_eq!(shade, DriverValue::Text("ULTRA_VIOLET".into()));
    let by_hour = unit
        .query::<Kinds>("where hour = ?", &[Hour::new(moment).into()])
        .expect("Failed to query by hour")
        .map(|v| v.map(|v| v.id))
        .collect::<Result<Vec<_>, _>>()
        .expect("Failed to read the records by hour");
    assert_eq!(by_hour, [1]);
    for (column, parameter) in [
        ("local_date_time", Parameter::timestamp(moment)),
        ("hour", Parameter::timestamp(Hour::new(moment))),
        ("local_date", Parameter::timestamp(moment.date())),
    ] {
        let found = unit
            .query::<StampedKinds>(&format!("where {column} = ?"), &[parameter])
            .unwrap_or_else(|e| panic!("Failed to query stamped kinds by {column}: {e}"))
            .map(|v| v.map(|v| v.id))
            .collect::<Result<Vec<_>, _>>()
            .unwrap_or_else(|e| panic!("Failed to read stamped kinds by {column}: {e}"));
        assert_eq!(found, [1], "Stamped {column} should match a timestamp parameter");
    }
    if *unit.dialect() == Dialect::Sqlite {
        let textual = unit
            .query_scalar(
                "select count(*) from stamped_kinds where hour = ?",
                &[Hour::new(moment).into()],
            )
            .expect("Failed to count by textual hour");
        assert_eq!(textual, DriverValue::Int64(0));
        let hour = unit
            .query_scalar("select hour from stamped_kinds where id = 1", &[])
            .expect("Failed to read the stamped hour");
        assert_eq!(hour, DriverValue::Text("2024-03-05 14:00:00.000000000".into()));
    }
    unit.commit_and_close().expect("Failed to close the unit");
}
