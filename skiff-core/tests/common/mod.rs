#![allow(dead_code)]
use anyhow::anyhow;
use skiff_core::{
    AsValue, AttributeDeclaration, Connection, ConnectionSource, Dialect, Driver, DriverValue,
    GenericSqlWriter, Record, RecordDeclaration, RowLabeled, RowNames, Rows, Statement,
};
use std::{cell::RefCell, collections::VecDeque, rc::Rc, sync::Arc};

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Department {
    pub id: Option<i64>,
    pub name: String,
    pub budget: Option<i32>,
}

impl Record for Department {
    fn declare() -> RecordDeclaration<Self> {
        RecordDeclaration::new("Department")
            .attribute(
                AttributeDeclaration::field(
                    "id",
                    <Option<i64> as AsValue>::KIND,
                    |r: &Self| r.id.as_value(),
                    |r: &mut Self, v| {
                        r.id = AsValue::try_from_value(v)?;
                        Ok(())
                    },
                )
                .sequence("department_seq")
                .ignore_dialects(["mysql"]),
            )
            .attribute(AttributeDeclaration::field(
                "name",
                <String as AsValue>::KIND,
                |r: &Self| r.name.clone().as_value(),
                |r: &mut Self, v| {
                    r.name = AsValue::try_from_value(v)?;
                    Ok(())
                },
            ))
            .attribute(AttributeDeclaration::field(
                "budget",
                <Option<i32> as AsValue>::KIND,
                |r: &Self| r.budget.as_value(),
                |r: &mut Self, v| {
                    r.budget = AsValue::try_from_value(v)?;
                    Ok(())
                },
            ))
    }
}

/// Something that happened on a scripted connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    AutoCommit(bool),
    Execute(String, Vec<DriverValue>),
    RowsClosed,
    Commit,
    Rollback,
    Release,
}

/// What the next executed statement produces.
#[derive(Debug, Clone)]
pub enum Response {
    Count(u64),
    Rows(Vec<&'static str>, Vec<Vec<DriverValue>>),
    Fail(&'static str),
}

#[derive(Default, Clone)]
pub struct Script {
    pub events: Rc<RefCell<Vec<Event>>>,
    pub responses: Rc<RefCell<VecDeque<Response>>>,
}

impl Script {
    pub fn respond(&self, response: Response) -> &Self {
        self.responses.borrow_mut().push_back(response);
        self
    }
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
    pub fn executed(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|v| match v {
                Event::Execute(sql, ..) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }
    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
    fn next_response(&self) -> anyhow::Result<Response> {
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("No scripted response left"))
    }
}

pub struct ScriptedDriver {
    dialect: Dialect,
}

impl Driver for ScriptedDriver {
    const NAME: &'static str = "scripted";
    type SqlWriter = GenericSqlWriter;

    fn dialect(&self) -> Dialect {
        self.dialect.clone()
    }
    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter
    }
}

pub struct ScriptedSource {
    pub dialect: Dialect,
    pub script: Script,
}

impl ScriptedSource {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            script: Default::default(),
        }
    }
}

impl ConnectionSource for ScriptedSource {
    type Connection = ScriptedConnection;

    fn acquire(&self) -> anyhow::Result<ScriptedConnection> {
        Ok(ScriptedConnection {
            driver: ScriptedDriver {
                dialect: self.dialect.clone(),
            },
            script: self.script.clone(),
        })
    }
    fn release(&self, _connection: ScriptedConnection) -> anyhow::Result<()> {
        self.script.record(Event::Release);
        Ok(())
    }
}

pub struct ScriptedConnection {
    driver: ScriptedDriver,
    script: Script,
}

impl Connection for ScriptedConnection {
    type Driver = ScriptedDriver;
    type Statement = ScriptedStatement;

    fn driver(&self) -> &ScriptedDriver {
        &self.driver
    }
    fn prepare(&mut self, sql: &str) -> anyhow::Result<ScriptedStatement> {
        Ok(ScriptedStatement {
            sql: sql.to_string(),
            params: Vec::new(),
            script: self.script.clone(),
        })
    }
    fn set_auto_commit(&mut self, auto_commit: bool) -> anyhow::Result<()> {
        self.script.record(Event::AutoCommit(auto_commit));
        Ok(())
    }
    fn commit(&mut self) -> anyhow::Result<()> {
        self.script.record(Event::Commit);
        Ok(())
    }
    fn rollback(&mut self) -> anyhow::Result<()> {
        self.script.record(Event::Rollback);
        Ok(())
    }
}

pub struct ScriptedStatement {
    sql: String,
    params: Vec<DriverValue>,
    script: Script,
}

impl ScriptedStatement {
    fn run(&mut self) -> anyhow::Result<Response> {
        self.script.record(Event::Execute(
            self.sql.clone(),
            std::mem::take(&mut self.params),
        ));
        match self.script.next_response()? {
            Response::Fail(message) => Err(anyhow!(message)),
            response => Ok(response),
        }
    }
}

impl Statement for ScriptedStatement {
    type Rows = ScriptedRows;

    fn bind(&mut self, index: usize, value: &DriverValue) -> anyhow::Result<()> {
        if self.params.len() <= index {
            self.params.resize(index + 1, DriverValue::Null);
        }
        self.params[index] = value.clone();
        Ok(())
    }
    fn execute_update(&mut self) -> anyhow::Result<u64> {
        match self.run()? {
            Response::Count(count) => Ok(count),
            other => Err(anyhow!("Expected a row count, scripted {other:?}")),
        }
    }
    fn execute_query(mut self) -> anyhow::Result<ScriptedRows> {
        match self.run()? {
            Response::Rows(labels, rows) => Ok(ScriptedRows {
                labels: labels.into_iter().map(String::from).collect::<Vec<_>>().into(),
                rows: rows.into(),
                script: self.script.clone(),
            }),
            other => Err(anyhow!("Expected rows, scripted {other:?}")),
        }
    }
}

pub struct ScriptedRows {
    labels: RowNames,
    rows: VecDeque<Vec<DriverValue>>,
    script: Script,
}

impl Rows for ScriptedRows {
    fn labels(&self) -> &RowNames {
        &self.labels
    }
    fn fetch(&mut self) -> anyhow::Result<Option<RowLabeled>> {
        Ok(self
            .rows
            .pop_front()
            .map(|v| RowLabeled::new(Arc::clone(&self.labels), v.into())))
    }
}

impl Drop for ScriptedRows {
    fn drop(&mut self) {
        self.script.record(Event::RowsClosed);
    }
}
