//! Библиотека потокового чтения и записи CSV.
//!
//! Этот крейт предоставляет два уровня работы с CSV:
//!
//! - **Сырые строки** — посимвольный разбор с правилами закавычивания
//!   ([`parse::LineParser`], [`reader::CsvReader`], [`writer::RowWriter`])
//! - **Типизированные записи** — отображение колонок на члены структур
//!   через `serde` ([`reader::RecordReader`], [`writer::RecordWriter`])
//!
//! Разделитель, квалификатор текста и терминатор строки настраиваются
//! через [`settings::CsvSettings`]; единый флаг `ignore_errors`
//! переключает режим терпимости к ошибкам данных.
//!
//! # Быстрый старт
//!
//! ```
//! use std::io::Cursor;
//! use csvio::reader::CsvReader;
//! use csvio::settings::CsvSettings;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Account {
//!     id: u64,
//!     name: String,
//! }
//!
//! let input = Cursor::new("id,name\n1,alice\n2,bob\n");
//! let reader = CsvReader::new(input, CsvSettings::default());
//! let accounts: Vec<Account> =
//!     reader.into_records().unwrap().collect::<Result<_, _>>().unwrap();
//!
//! assert_eq!(accounts.len(), 2);
//! assert_eq!(accounts[1].name, "bob");
//! ```

pub mod error;
pub mod parse;
pub mod reader;
pub mod record;
pub mod settings;
pub mod writer;

pub use error::{CsvError, CsvResult};
pub use settings::CsvSettings;
