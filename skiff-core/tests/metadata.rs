mod common;

#[cfg(test)]
mod tests {
    use crate::common::Department;
    use indoc::indoc;
    use skiff_core::{
        AsValue, AttributeDeclaration, Day, Dialect, DriverValue, Error, GenericSqlWriter,
        KeyPlan, Record, RecordDeclaration, SqlWriter, Value, ValueKind, describe,
        describe_table, register,
    };
    use std::{
        sync::{Arc, Barrier},
        thread,
    };
    use time::macros::datetime;

    #[derive(Default)]
    #[allow(dead_code)]
    struct Visit {
        patient: i32,
        day: Option<Day>,
        notes: Option<String>,
        tags: Vec<String>,
        cache: Option<String>,
    }

    impl Visit {
        fn notes(&self) -> Option<String> {
            self.notes.clone()
        }
        fn set_notes(&mut self, value: Option<String>) {
            self.notes = value;
        }
    }

    impl Record for Visit {
        fn declare() -> RecordDeclaration<Self> {
            RecordDeclaration::new("clinic::VisitRecord")
                .attribute(
                    AttributeDeclaration::field(
                        "patient",
                        <i32 as AsValue>::KIND,
                        |r: &Self| r.patient.as_value(),
                        |r: &mut Self, v| {
                            r.patient = AsValue::try_from_value(v)?;
                            Ok(())
                        },
                    )
                    .key()
                    .column("patientId"),
                )
                .attribute(
                    AttributeDeclaration::field(
                        "visitDay",
                        <Option<Day> as AsValue>::KIND,
                        |r: &Self| r.day.as_value(),
                        |r: &mut Self, v| {
                            r.day = AsValue::try_from_value(v)?;
                            Ok(())
                        },
                    )
                    .key()
                    .timestamp(),
                )
                .attribute(AttributeDeclaration::property(
                    "notes",
                    <Option<String> as AsValue>::KIND,
                    |r: &Self| r.notes().as_value(),
                    |r: &mut Self, v| {
                        r.set_notes(AsValue::try_from_value(v)?);
                        Ok(())
                    },
                ))
                .attribute(AttributeDeclaration::collection("tags"))
                .attribute(AttributeDeclaration::ignored("cache"))
        }
    }

    #[derive(Default)]
    struct Note {
        text: String,
    }

    impl Record for Note {
        fn declare() -> RecordDeclaration<Self> {
            RecordDeclaration::new("Note").attribute(AttributeDeclaration::field(
                "text",
                <String as AsValue>::KIND,
                |r: &Self| r.text.clone().as_value(),
                |r: &mut Self, v| {
                    r.text = AsValue::try_from_value(v)?;
                    Ok(())
                },
            ))
        }
    }

    #[derive(Default)]
    struct Label {
        text: String,
    }

    impl Record for Label {
        fn declare() -> RecordDeclaration<Self> {
            RecordDeclaration::new("Label").attribute(AttributeDeclaration::field(
                "text",
                <String as AsValue>::KIND,
                |r: &Self| r.text.clone().as_value(),
                |r: &mut Self, v| {
                    r.text = AsValue::try_from_value(v)?;
                    Ok(())
                },
            ))
        }
    }

    #[derive(Default)]
    struct Ledger {
        code: String,
        amount: i64,
    }

    impl Record for Ledger {
        fn declare() -> RecordDeclaration<Self> {
            RecordDeclaration::new("Ledger")
                .relation("ledger_entries")
                .attribute(AttributeDeclaration::field(
                    "code",
                    <String as AsValue>::KIND,
                    |r: &Self| r.code.clone().as_value(),
                    |r: &mut Self, v| {
                        r.code = AsValue::try_from_value(v)?;
                        Ok(())
                    },
                ))
                .attribute(AttributeDeclaration::field(
                    "amount",
                    <i64 as AsValue>::KIND,
                    |r: &Self| r.amount.as_value(),
                    |r: &mut Self, v| {
                        r.amount = AsValue::try_from_value(v)?;
                        Ok(())
                    },
                ))
        }
    }

    #[derive(Default)]
    struct Marked {
        id: i64,
    }

    impl Record for Marked {
        fn declare() -> RecordDeclaration<Self> {
            RecordDeclaration::new("Marked").attribute(
                AttributeDeclaration::field(
                    "id",
                    <i64 as AsValue>::KIND,
                    |r: &Self| r.id.as_value(),
                    |r: &mut Self, v| {
                        r.id = AsValue::try_from_value(v)?;
                        Ok(())
                    },
                )
                .key(),
            )
        }
    }

    #[derive(Default)]
    struct Blob;

    impl Record for Blob {
        fn declare() -> RecordDeclaration<Self> {
            RecordDeclaration::new("Blob")
                .attribute(AttributeDeclaration::unsupported("ratio", "f64"))
        }
    }

    #[derive(Default)]
    struct Ward {
        name: String,
    }

    impl Record for Ward {
        fn declare() -> RecordDeclaration<Self> {
            RecordDeclaration::new("Ward").attribute(
                AttributeDeclaration::field(
                    "name",
                    <String as AsValue>::KIND,
                    |r: &Self| r.name.clone().as_value(),
                    |r: &mut Self, v| {
                        r.name = AsValue::try_from_value(v)?;
                        Ok(())
                    },
                )
                .key(),
            )
        }
    }

    #[derive(Default)]
    struct PlainKey {
        id: i64,
    }

    impl Record for PlainKey {
        fn declare() -> RecordDeclaration<Self> {
            RecordDeclaration::new("PlainKey").attribute(
                AttributeDeclaration::field(
                    "id",
                    <i64 as AsValue>::KIND,
                    |r: &Self| r.id.as_value(),
                    |r: &mut Self, v| {
                        r.id = AsValue::try_from_value(v)?;
                        Ok(())
                    },
                )
                .sequence("plain_seq"),
            )
        }
    }

    #[derive(Default)]
    struct TextKey {
        code: String,
    }

    impl Record for TextKey {
        fn declare() -> RecordDeclaration<Self> {
            RecordDeclaration::new("TextKey").attribute(
                AttributeDeclaration::field(
                    "code",
                    <String as AsValue>::KIND,
                    |r: &Self| r.code.clone().as_value(),
                    |r: &mut Self, v| {
                        r.code = AsValue::try_from_value(v)?;
                        Ok(())
                    },
                )
                .sequence("code_seq"),
            )
        }
    }

    #[test]
    fn descriptor_is_computed_once() {
        let first = describe::<Department>().unwrap();
        let second = Department::describe().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(matches!(
            register::<Department>(&["id"]),
            Err(Error::DuplicateRegistration { .. })
        ));
        assert!(Arc::ptr_eq(&first, &describe::<Department>().unwrap()));
    }

    #[test]
    fn racing_describe_is_shared() {
        let barrier = Barrier::new(8);
        let descriptors = thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        describe::<Ward>().expect("Failed to describe Ward")
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|v| v.join().expect("Describing thread panicked"))
                .collect::<Vec<_>>()
        });
        let first = describe::<Ward>().expect("Failed to describe Ward");
        for descriptor in &descriptors {
            assert!(Arc::ptr_eq(&first, descriptor));
        }
        assert_eq!(first.relation(), "ward");
    }

    #[test]
    fn visit_descriptor() {
        let descriptor = describe_table::<Visit>().unwrap();
        assert_eq!(descriptor.relation(), "visit");
        let names: Vec<_> = descriptor
            .attributes()
            .iter()
            .map(|v| (v.attribute_name.as_str(), v.column_name.as_str()))
            .collect();
        assert_eq!(
            names,
            [
                ("patient", "patientId"),
                ("visitDay", "visit_day"),
                ("notes", "notes")
            ]
        );
        let keys: Vec<_> = descriptor
            .key_attributes()
            .map(|v| v.attribute_name.as_str())
            .collect();
        assert_eq!(keys, ["patient", "visitDay"]);
        let day = descriptor.attribute("visitDay").unwrap();
        assert_eq!(day.kind, ValueKind::Day);
        assert!(day.store_as_timestamp);
        assert!(descriptor.attribute("notes").unwrap().accessor.is_property());
        assert!(descriptor.attribute("tags").is_none());
        assert!(descriptor.attribute("cache").is_none());
        assert!(matches!(
            descriptor.single_key(),
            Err(Error::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn visit_statements() {
        let descriptor = describe_table::<Visit>().unwrap();
        let writer = GenericSqlWriter;
        let mut visit = Visit {
            patient: 4,
            day: Some(Day::new(datetime!(2024-03-05 10:00))),
            notes: None,
            tags: vec!["a".into()],
            cache: Some("x".into()),
        };
        let insert = writer.write_insert(&descriptor, &visit, None);
        assert_eq!(
            insert.sql,
            "insert into visit (patientId, visit_day) values (?, ?)"
        );
        assert_eq!(
            insert.params,
            [
                DriverValue::Int32(4),
                DriverValue::Timestamp(datetime!(2024-03-05 0:00))
            ]
        );
        visit.notes = Some("fever".into());
        let update = writer.write_update(&descriptor, &visit).unwrap();
        assert_eq!(
            update.sql,
            "update visit set notes = ? where patientId = ? and visit_day = ?"
        );
        assert_eq!(update.params[0], DriverValue::Text("fever".into()));
        let delete = writer
            .write_delete_by_key(
                &descriptor,
                vec![Value::Int32(Some(4)), Value::Day(None)],
            )
            .unwrap();
        assert_eq!(
            delete.sql,
            "delete from visit where patientId = ? and visit_day = ?"
        );
        assert_eq!(delete.params[1], DriverValue::Null);
        assert!(matches!(
            writer.write_delete_by_key(&descriptor, vec![Value::Int32(Some(4))]),
            Err(Error::UnsupportedShape { .. })
        ));
        assert!(matches!(
            writer.write_select_by_key(&descriptor, Value::Int32(Some(4)), false),
            Err(Error::UnsupportedShape { .. })
        ));
        let select = writer
            .write_select_by_keys(
                &descriptor,
                vec![Value::Int32(Some(4)), visit.day.as_value()],
                true,
            )
            .unwrap();
        assert_eq!(
            select.sql,
            "select * from visit where patientId = ? and visit_day = ? for update"
        );
    }

    #[test]
    fn predicate_select() {
        let descriptor = describe::<Department>().unwrap();
        let writer = GenericSqlWriter;
        assert_eq!(
            writer.write_select(&descriptor, "where name like ?", false),
            "select * from department where name like ?"
        );
        let verbatim = indoc! {"
            select d.*
            from department d
            join employee e on e.department_id = d.id
        "};
        assert_eq!(writer.write_select(&descriptor, verbatim, false), verbatim);
        assert_eq!(
            writer.write_select(&descriptor, "select * from department", true),
            "select * from department for update"
        );
    }

    #[test]
    fn insert_with_returning() {
        let descriptor = describe::<Department>().unwrap();
        let department = Department::default();
        let insert = GenericSqlWriter.write_insert(&descriptor, &department, Some("id"));
        assert_eq!(
            insert.sql,
            "insert into department (name) values (?) returning id"
        );
        assert_eq!(
            describe::<Department>()
                .unwrap()
                .generated_key()
                .unwrap()
                .plan(&Dialect::Postgres)
                .unwrap(),
            KeyPlan::Sequence {
                sql: "select nextval('department_seq')".into()
            }
        );
    }

    #[test]
    fn register_external_keys() {
        let descriptor = register::<Ledger>(&["code"]).unwrap();
        assert_eq!(descriptor.relation(), "ledger_entries");
        assert_eq!(descriptor.single_key().unwrap().column_name, "code");
        assert!(Arc::ptr_eq(&descriptor, &describe_table::<Ledger>().unwrap()));
        assert!(matches!(
            register::<Ledger>(&["code"]),
            Err(Error::DuplicateRegistration { .. })
        ));
    }

    #[test]
    fn conflicting_and_unknown_keys() {
        assert!(matches!(
            register::<Marked>(&["id"]),
            Err(Error::ConflictingKeyDeclaration { .. })
        ));
        assert!(matches!(
            register::<Label>(&["missing"]),
            Err(Error::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn no_primary_key_only_for_tables() {
        let descriptor = describe::<Note>().unwrap();
        assert!(!descriptor.has_key());
        assert_eq!(descriptor.relation(), "note");
        assert!(matches!(
            describe_table::<Note>(),
            Err(Error::NoPrimaryKey { .. })
        ));
        assert!(matches!(
            GenericSqlWriter.write_delete(&descriptor, &Note::default()),
            Err(Error::NoPrimaryKey { .. })
        ));
    }

    #[test]
    fn invalid_declarations() {
        let Err(Error::UnsupportedAttributeType { type_name }) = describe::<Blob>() else {
            panic!("Expected an unsupported attribute type");
        };
        assert_eq!(type_name, "f64");
        assert!(matches!(
            describe::<TextKey>(),
            Err(Error::InvalidGeneratedKey { .. })
        ));
        let Err(Error::InvalidGeneratedKey { reason, .. }) = describe::<PlainKey>() else {
            panic!("A key that is never absent cannot be generated");
        };
        assert!(reason.contains("`id`"), "Unexpected reason: {reason}");
    }
}
