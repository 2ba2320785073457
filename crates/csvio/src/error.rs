//! Модуль ошибок CSV-кодека.

use std::{fmt, io};

use serde::{de, ser};
use thiserror::Error;

/// Главная ошибка чтения и записи CSV.
///
/// Объединяет все возможные ошибки кодека: I/O ошибки, ошибки
/// разбора на уровне символов, ошибки привязки колонок к полям
/// целевой записи и ошибки конверсии значений.
#[derive(Debug, Error)]
pub enum CsvError {
    // === I/O ошибки ===
    /// Ошибка ввода/вывода.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Некорректная UTF-8 последовательность во входном потоке.
    #[error("Invalid UTF-8 byte sequence at line {line}")]
    InvalidUtf8 {
        /// Номер строки (1-based).
        line: usize,
    },

    // === Ошибки разбора строк ===
    /// Поток закончился внутри закавыченного поля.
    #[error("Unterminated quoted field starting at line {line}")]
    MalformedQuoting {
        /// Номер строки, на которой поле открылось (1-based).
        line: usize,
    },

    /// Ширина строки не совпадает с шириной заголовка.
    #[error("Row at line {line} has {actual} column(s), header has {expected}")]
    ColumnCountMismatch {
        /// Количество колонок в заголовке.
        expected: usize,
        /// Фактическое количество полей в строке.
        actual: usize,
        /// Номер строки (1-based).
        line: usize,
    },

    // === Ошибки привязки колонок ===
    /// Имя колонки не совпадает ни с одним полем целевой записи.
    #[error("Column '{0}' does not match any record member")]
    UnresolvedColumn(String),

    /// Поле записи имеет форму, непредставимую одним CSV-значением.
    ///
    /// Ошибка конфигурации типа записи. Никогда не подавляется
    /// флагом `ignore_errors`, в отличие от остальных ошибок привязки.
    #[error("Record member has an unsupported shape: {0}")]
    UnsupportedShape(&'static str),

    /// Заголовки недоступны: нет строки заголовка и не заданы
    /// `assumed_headers`.
    #[error("No headers available for record mapping")]
    MissingHeaders,

    // === Ошибки значений ===
    /// Текст поля не разбирается как объявленный тип.
    #[error("Cannot convert '{value}' in column '{column}': {message}")]
    ValueConversion {
        /// Имя колонки.
        column: String,
        /// Позиция колонки (0-based).
        index: usize,
        /// Исходный текст поля.
        value: String,
        /// Описание ошибки конверсии.
        message: String,
    },

    /// Null-значение там, где оно не разрешено.
    #[error("Null value in column '{column}' is not permitted")]
    NullNotPermitted {
        /// Имя колонки (или `?`, если имя неизвестно в точке ошибки).
        column: String,
    },

    // === Прочее ===
    /// Произвольное сообщение от инфраструктуры Serde
    /// (например, отчёт derive о пропущенном обязательном поле).
    #[error("{0}")]
    Message(String),
}

/// Удобный alias для Result с CsvError.
pub type CsvResult<T> = Result<T, CsvError>;

// Требуется для serde::ser::Serializer
impl ser::Error for CsvError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

// Требуется для serde::de::Deserializer
impl de::Error for CsvError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}
