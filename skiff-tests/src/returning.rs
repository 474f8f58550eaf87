use crate::schema::recreate;
use skiff::{ConnectionSource, ConnectionUnit, DriverValue, Record};

#[derive(Debug, Default, Clone, PartialEq, Record)]
struct Invoice {
    #[skiff(sequence = "invoice_seq")]
    id: Option<i64>,
    customer: String,
    total: Option<i64>,
}

pub fn returning<S: ConnectionSource>(source: &S) {
    recreate(
        source,
        "invoice",
        "id {key}, customer VARCHAR(50) NOT NULL, total BIGINT DEFAULT 0",
        Some("invoice_seq"),
    );
    let mut unit = ConnectionUnit::from_source(source).expect("Failed to start a unit");
    let mut invoice = Invoice {
        customer: "ACME".into(),
        ..Default::default()
    };
    let total = unit
        .insert_returning(&mut invoice, "total")
        .expect("Failed to insert the invoice");
    assert_eq!(total.as_i64(), Some(0));
    let id = invoice.id.expect("The key of the invoice was not generated");
    let mut second = Invoice {
        customer: "Initech".into(),
        total: Some(250),
        ..Default::default()
    };
    let returned = unit
        .insert_returning(&mut second, "customer")
        .expect("Failed to insert the second invoice");
    assert_eq!(returned, DriverValue::Text("Initech".into()));
    assert!(second.id.expect("The key of the second invoice was not generated") > id);
    unit.commit_and_close().expect("Failed to commit the invoices");
}
