use anyhow::{Result, anyhow};
use libsqlite3_sys::*;
use skiff_core::DriverValue;
use std::{
    ffi::{CStr, c_int},
    slice,
};

pub(crate) fn extract_value(statement: *mut sqlite3_stmt, index: c_int) -> Result<DriverValue> {
    unsafe {
        let column_type = sqlite3_column_type(statement, index);
        Ok(match column_type {
            SQLITE_NULL => DriverValue::Null,
            SQLITE_INTEGER => DriverValue::Int64(sqlite3_column_int64(statement, index)),
            SQLITE_FLOAT => DriverValue::Real(sqlite3_column_double(statement, index)),
            SQLITE_BLOB => {
                let ptr = sqlite3_column_blob(statement, index) as *const u8;
                let len = sqlite3_column_bytes(statement, index) as usize;
                if ptr.is_null() || len == 0 {
                    DriverValue::Blob(Box::default())
                } else {
                    DriverValue::Blob(slice::from_raw_parts(ptr, len).into())
                }
            }
            SQLITE_TEXT => {
                let ptr = sqlite3_column_text(statement, index);
                let len = sqlite3_column_bytes(statement, index) as usize;
                if ptr.is_null() || len == 0 {
                    DriverValue::Text(String::new())
                } else {
                    DriverValue::Text(
                        String::from_utf8_lossy(slice::from_raw_parts(ptr, len)).into_owned(),
                    )
                }
            }
            _ => return Err(anyhow!("Unexpected column type {column_type}")),
        })
    }
}

pub(crate) fn extract_name(statement: *mut sqlite3_stmt, index: c_int) -> Result<String> {
    unsafe {
        let name = sqlite3_column_name(statement, index);
        if name.is_null() {
            return Err(anyhow!("Could not read the name of column {index}"));
        }
        Ok(CStr::from_ptr(name).to_str()?.into())
    }
}
