use crate::schema::recreate;
use skiff::{
    ConnectionSource, ConnectionUnit, DriverValue, Enumeration, Error, Record, Value, register,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Enumeration)]
enum Priority {
    #[default]
    Low,
    High,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[skiff(table = "work_items")]
struct WorkItem {
    #[skiff(key, column = "item_code")]
    code: String,
    #[skiff(enumeration)]
    priority: Priority,
    #[skiff(getter = "title", setter = "set_title")]
    title: String,
    watchers: Vec<String>,
    #[skiff(ignore)]
    scratch: Option<String>,
}

impl WorkItem {
    fn title(&self) -> String {
        self.title.trim().to_string()
    }
    fn set_title(&mut self, value: String) {
        self.title = value;
    }
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[skiff(table = "assignments")]
struct Assignment {
    #[skiff(key)]
    item_code: String,
    #[skiff(key)]
    person: String,
    hours: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Tag {
    name: String,
    uses: i32,
}

pub fn odd<S: ConnectionSource>(source: &S) {
    recreate(
        source,
        "work_items",
        "item_code VARCHAR(20) PRIMARY KEY, priority VARCHAR(10) NOT NULL, title VARCHAR(100)",
        None,
    );
    recreate(
        source,
        "assignments",
        "item_code VARCHAR(20), person VARCHAR(20), hours INTEGER NOT NULL, \
         PRIMARY KEY (item_code, person)",
        None,
    );
    recreate(
        source,
        "tag",
        "name VARCHAR(20) PRIMARY KEY, uses INTEGER NOT NULL",
        None,
    );

    // Enumerations, properties, collections and ignored attributes
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let mut item = WorkItem {
        code: "W-1".into(),
        priority: Priority::High,
        title: "  Fix the build  ".into(),
        watchers: vec!["ada".into(), "alan".into()],
        scratch: Some("draft".into()),
    };
    unit.insert(&mut item).expect("Failed to insert a work item");
    let loaded: WorkItem = unit.get("W-1".to_string()).expect("Failed to get the work item");
    assert_eq!(
        loaded,
        WorkItem {
            code: "W-1".into(),
            priority: Priority::High,
            title: "Fix the build".into(),
            watchers: Vec::new(),
            scratch: None,
        }
    );
    let priority = unit
        .query_scalar(
            "select priority from work_items where item_code = ?",
            &[Value::Text(Some("W-1".into())).into()],
        )
        .expect("Failed to read the priority");
    assert_eq!(priority, DriverValue::Text(Priority::High.name().into()));
    unit.execute(
        "update work_items set priority = 'Urgent' where item_code = ?",
        &[Value::Text(Some("W-1".into())).into()],
    )
    .expect("Failed to corrupt the priority");
    assert!(matches!(
        unit.get::<WorkItem>("W-1".to_string()),
        Err(Error::Conversion { .. })
    ));
    unit.rollback_and_close().expect("Failed to roll back");

    // Composite keys
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    for (person, hours) in [("ada", 3), ("alan", 5)] {
        unit.insert(&mut Assignment {
            item_code: "W-1".into(),
            person: person.into(),
            hours,
        })
        .expect("Failed to insert an assignment");
    }
    let key = |person: &str| {
        [
            Value::Text(Some("W-1".into())),
            Value::Text(Some(person.into())),
        ]
    };
    let alan: Assignment = unit
        .get_by_key(&key("alan"))
        .expect("Failed to get the assignment by its key");
    assert_eq!(alan.hours, 5);
    assert!(matches!(
        unit.get::<Assignment>("W-1".to_string()),
        Err(Error::UnsupportedShape { .. })
    ));
    assert!(matches!(
        unit.get_by_key::<Assignment>(&key("alan")[..1]),
        Err(Error::UnsupportedShape { .. })
    ));
    unit.delete_by_key::<Assignment>(&key("ada"))
        .expect("Failed to delete the assignment by its key");
    assert!(matches!(
        unit.get_by_key::<Assignment>(&key("ada")),
        Err(Error::NotFound { .. })
    ));
    unit.commit_and_close().expect("Failed to commit the assignments");

    // Keys registered from outside the record type
    match register::<Tag>(&["name"]) {
        Ok(..) | Err(Error::DuplicateRegistration { .. }) => {}
        Err(e) => panic!("Failed to register the key of tag: {e}"),
    }
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let mut tag = Tag {
        name: "rust".into(),
        uses: 1,
    };
    unit.insert(&mut tag).expect("Failed to insert a tag");
    tag.uses = 2;
    unit.update(&tag).expect("Failed to update the tag");
    assert_eq!(
        unit.get::<Tag>("rust".to_string())
            .expect("Failed to get the tag")
            .uses,
        2
    );
    unit.delete(&tag).expect("Failed to delete the tag");
    assert!(matches!(unit.delete(&tag), Err(Error::NotFound { .. })));
    unit.commit_and_close().expect("Failed to commit the tags");
}
