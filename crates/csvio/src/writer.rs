//! Потоковые writer'ы для CSV.
//!
//! [`RowWriter`] записывает сырые строки полей с корректным
//! закавычиванием и экранированием; [`RecordWriter`] — типизированные
//! записи через слой отображения [`record`](crate::record), со строкой
//! заголовка перед первой записью.

use std::{
    io::{BufWriter, Write},
    marker::PhantomData,
};

use serde::Serialize;

use crate::{
    error::{CsvError, CsvResult},
    parse::Field,
    record,
    settings::CsvSettings,
};

/// Потоковый writer сырых строк.
///
/// Поле закавычивается, если содержит разделитель, квалификатор,
/// терминатор строки, краевые пробелы (при `trim_whitespace`) или
/// совпадает с null-меткой (при `allow_null`). Вложенный квалификатор
/// удваивается. Вывод гарантированно проходит обратный разбор через
/// [`LineParser`](crate::parse::LineParser) с тем же содержимым полей,
/// пока квалификатор не отключён.
///
/// # Пример
///
/// ```
/// use csvio::settings::CsvSettings;
/// use csvio::writer::RowWriter;
///
/// let mut out = Vec::new();
/// let mut writer = RowWriter::new(&mut out, CsvSettings::default().with_line_separator("\n"));
/// writer.write_row(&[Some("a,b".to_string()), Some("c".to_string())]).unwrap();
/// writer.flush().unwrap();
/// drop(writer);
///
/// assert_eq!(String::from_utf8(out).unwrap(), "\"a,b\",c\n");
/// ```
pub struct RowWriter<W: Write> {
    inner: BufWriter<W>,
    settings: CsvSettings,
    /// Счётчик записанных строк данных.
    rows_written: usize,
}

impl<W: Write> RowWriter<W> {
    /// Создаёт новый writer.
    pub fn new(writer: W, settings: CsvSettings) -> Self {
        Self { inner: BufWriter::new(writer), settings, rows_written: 0 }
    }

    /// Создаёт writer с указанным размером буфера.
    pub fn with_capacity(capacity: usize, writer: W, settings: CsvSettings) -> Self {
        Self { inner: BufWriter::with_capacity(capacity, writer), settings, rows_written: 0 }
    }

    /// Настройки этого writer'а.
    #[must_use]
    pub fn settings(&self) -> &CsvSettings {
        &self.settings
    }

    /// Возвращает количество записанных строк данных (без заголовка).
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Записывает одну строку полей с терминатором.
    ///
    /// # Errors
    ///
    /// [`CsvError::NullNotPermitted`], если поле `None` при
    /// выключенном `allow_null`.
    pub fn write_row(&mut self, row: &[Field]) -> CsvResult<()> {
        for (idx, field) in row.iter().enumerate() {
            if idx > 0 {
                write_char(&mut self.inner, self.settings.delimiter)?;
            }
            self.write_field(field)?;
        }
        self.inner.write_all(self.settings.line_separator.as_bytes())?;
        self.rows_written += 1;
        Ok(())
    }

    /// Записывает строку заголовка из имён колонок. Не учитывается
    /// счётчиком строк данных.
    pub fn write_names<'n, I>(&mut self, names: I) -> CsvResult<()>
    where
        I: IntoIterator<Item = &'n str>,
    {
        for (idx, name) in names.into_iter().enumerate() {
            if idx > 0 {
                write_char(&mut self.inner, self.settings.delimiter)?;
            }
            self.write_text(name)?;
        }
        self.inner.write_all(self.settings.line_separator.as_bytes())?;
        Ok(())
    }

    /// Принудительно сбрасывает буфер.
    pub fn flush(&mut self) -> CsvResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Получает ссылку на внутренний writer.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Извлекает внутренний writer (с предварительным flush).
    pub fn into_inner(self) -> Result<W, std::io::IntoInnerError<BufWriter<W>>> {
        self.inner.into_inner()
    }

    fn write_field(&mut self, field: &Field) -> CsvResult<()> {
        match field {
            Some(text) => self.write_text(text),
            None => {
                if !self.settings.allow_null {
                    return Err(CsvError::NullNotPermitted { column: "?".to_string() });
                }
                // Метка пишется без кавычек, чтобы читаться обратно как null.
                self.inner.write_all(self.settings.null_sentinel.as_bytes())?;
                Ok(())
            }
        }
    }

    fn write_text(&mut self, text: &str) -> CsvResult<()> {
        match self.settings.qualifier {
            Some(qualifier) if self.needs_qualifying(text) => {
                write_char(&mut self.inner, qualifier)?;
                for c in text.chars() {
                    if c == qualifier {
                        write_char(&mut self.inner, qualifier)?;
                    }
                    write_char(&mut self.inner, c)?;
                }
                write_char(&mut self.inner, qualifier)?;
                Ok(())
            }
            _ => {
                self.inner.write_all(text.as_bytes())?;
                Ok(())
            }
        }
    }

    fn needs_qualifying(&self, text: &str) -> bool {
        let s = &self.settings;
        if text.contains(s.delimiter) || text.contains('\n') || text.contains('\r') {
            return true;
        }
        if let Some(q) = s.qualifier {
            if text.contains(q) {
                return true;
            }
        }
        if !s.line_separator.is_empty() && text.contains(s.line_separator.as_str()) {
            return true;
        }
        if s.trim_whitespace
            && (text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace))
        {
            return true;
        }
        // Литеральный текст, совпадающий с null-меткой, обязан быть
        // закавычен, иначе прочитается обратно как null.
        s.allow_null && text == s.null_sentinel
    }
}

fn write_char<W: Write>(writer: &mut W, c: char) -> std::io::Result<()> {
    let mut buf = [0u8; 4];
    writer.write_all(c.encode_utf8(&mut buf).as_bytes())
}

/// Потоковый writer типизированных записей.
///
/// Перед первой записью выводит строку заголовка с именами членов
/// (если `has_header`). Имена и значения получает через
/// [`record::to_row`].
///
/// # Пример
///
/// ```
/// use csvio::settings::CsvSettings;
/// use csvio::writer::RecordWriter;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Account {
///     id: u64,
///     name: String,
/// }
///
/// let mut out = Vec::new();
/// let settings = CsvSettings::default().with_line_separator("\n");
/// let mut writer = RecordWriter::new(&mut out, settings);
/// writer.write(&Account { id: 7, name: "alice".to_string() }).unwrap();
/// writer.flush().unwrap();
/// drop(writer);
///
/// assert_eq!(String::from_utf8(out).unwrap(), "id,name\n7,alice\n");
/// ```
pub struct RecordWriter<W: Write, T> {
    rows: RowWriter<W>,
    _record: PhantomData<T>,
    /// Счётчик записанных записей.
    records_written: usize,
    /// Флаг: записан ли заголовок.
    header_written: bool,
}

impl<W: Write, T: Serialize> RecordWriter<W, T> {
    /// Создаёт новый writer.
    pub fn new(writer: W, settings: CsvSettings) -> Self {
        Self {
            rows: RowWriter::new(writer, settings),
            _record: PhantomData,
            records_written: 0,
            header_written: false,
        }
    }

    /// Записывает одну запись (и заголовок перед самой первой,
    /// если `has_header`).
    pub fn write(&mut self, record: &T) -> CsvResult<()> {
        let (names, row) = record::to_row(self.rows.settings(), record)?;
        if !self.header_written {
            if self.rows.settings().has_header {
                self.rows.write_names(names.iter().copied())?;
            }
            self.header_written = true;
        }
        self.rows.write_row(&row)?;
        self.records_written += 1;
        Ok(())
    }

    /// Записывает несколько записей.
    pub fn write_all(&mut self, records: &[T]) -> CsvResult<()> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Принудительно сбрасывает буфер.
    pub fn flush(&mut self) -> CsvResult<()> {
        self.rows.flush()
    }

    /// Возвращает количество записанных записей.
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Извлекает внутренний writer (с предварительным flush).
    pub fn into_inner(self) -> Result<W, std::io::IntoInnerError<BufWriter<W>>> {
        self.rows.into_inner()
    }
}
