//! Потоковые reader'ы для CSV.
//!
//! [`CsvReader`] читает сырые строки полей поверх
//! [`LineParser`](crate::parse::LineParser), обрабатывая заголовок и
//! проверяя ширину строк; [`RecordReader`] поверх него выдаёт
//! типизированные записи через слой [`record`](crate::record).

use std::{
    collections::HashSet,
    io::{BufReader, Read},
    marker::PhantomData,
};

use serde::de::DeserializeOwned;

use crate::{
    error::{CsvError, CsvResult},
    parse::{LineParser, Row},
    record,
    settings::CsvSettings,
};

/// Потоковый reader сырых строк.
///
/// Первая строка потока трактуется как заголовок (при `has_header`)
/// либо имена берутся из `assumed_headers`. Ширина каждой строки
/// данных сверяется с ожидаемой; расхождение — это
/// [`CsvError::ColumnCountMismatch`], подавляемый флагом
/// `ignore_errors`.
///
/// # Пример
///
/// ```
/// use std::io::Cursor;
/// use csvio::reader::CsvReader;
/// use csvio::settings::CsvSettings;
///
/// let input = Cursor::new("id,name\n1,alice\n2,bob\n");
/// let mut reader = CsvReader::new(input, CsvSettings::default());
///
/// let rows: Vec<_> = reader.by_ref().collect::<Result<_, _>>().unwrap();
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0][1], Some("alice".to_string()));
/// assert_eq!(reader.headers().unwrap(), Some(&["id".to_string(), "name".to_string()][..]));
/// ```
pub struct CsvReader<R: Read> {
    parser: LineParser<BufReader<R>>,
    /// Имена колонок, известные после обработки заголовка.
    headers: Option<Vec<String>>,
    /// Ожидаемая ширина строки данных.
    expected_width: Option<usize>,
    /// Флаг: заголовок уже обработан.
    header_ready: bool,
    /// Счётчик прочитанных строк данных.
    rows_read: usize,
    /// Флаг завершения чтения (конец потока либо ошибка).
    finished: bool,
}

impl<R: Read> CsvReader<R> {
    /// Создаёт новый reader. Заголовок читается лениво, при первом
    /// обращении к данным.
    pub fn new(reader: R, settings: CsvSettings) -> Self {
        Self {
            parser: LineParser::new(BufReader::new(reader), settings),
            headers: None,
            expected_width: None,
            header_ready: false,
            rows_read: 0,
            finished: false,
        }
    }

    /// Настройки этого reader'а.
    #[must_use]
    pub fn settings(&self) -> &CsvSettings {
        self.parser.settings()
    }

    /// Возвращает количество прочитанных строк данных (без заголовка).
    #[must_use]
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Имена колонок, если они известны. Дочитывает заголовок при
    /// необходимости.
    pub fn headers(&mut self) -> CsvResult<Option<&[String]>> {
        self.ensure_header()?;
        Ok(self.headers.as_deref())
    }

    /// Читает следующую строку данных, `Ok(None)` в конце потока.
    ///
    /// # Errors
    ///
    /// [`CsvError::ColumnCountMismatch`], если ширина строки не
    /// совпадает с ожидаемой (подавляется `ignore_errors`), плюс
    /// ошибки нижележащего разбора.
    pub fn read_row(&mut self) -> CsvResult<Option<Row>> {
        self.ensure_header()?;
        // Номер строки фиксируется до чтения: после разбора парсер
        // уже стоит на следующей строке.
        let line = self.parser.line();
        let Some(row) = self.parser.read_row()? else {
            return Ok(None);
        };

        let expected = *self.expected_width.get_or_insert(row.len());
        if row.len() != expected && !self.settings().ignore_errors {
            return Err(CsvError::ColumnCountMismatch { expected, actual: row.len(), line });
        }

        self.rows_read += 1;
        Ok(Some(row))
    }

    /// Превращает reader в итератор типизированных записей.
    ///
    /// Каждая колонка заголовка сопоставляется одноимённому члену
    /// типа `T`, каждый член — одноимённой колонке. Несопоставимые
    /// имена — это [`CsvError::UnresolvedColumn`] ещё до чтения
    /// данных; под `ignore_errors` лишние колонки игнорируются, а
    /// недостающие члены заполняются значениями по умолчанию.
    ///
    /// # Errors
    ///
    /// [`CsvError::MissingHeaders`], если имена колонок неизвестны;
    /// [`CsvError::UnsupportedShape`], если `T` не структура с
    /// именованными членами.
    pub fn into_records<T: DeserializeOwned>(mut self) -> CsvResult<RecordReader<R, T>> {
        self.ensure_header()?;
        let headers = self.headers.clone().ok_or(CsvError::MissingHeaders)?;
        let fields = record::struct_fields::<T>()
            .ok_or(CsvError::UnsupportedShape("record type is not a struct"))?;

        let mut masked = HashSet::new();
        for (index, header) in headers.iter().enumerate() {
            if !fields.contains(&header.as_str()) {
                if !self.settings().ignore_errors {
                    return Err(CsvError::UnresolvedColumn(header.clone()));
                }
                masked.insert(index);
            }
        }
        for field in fields {
            if !headers.iter().any(|h| h == field) && !self.settings().ignore_errors {
                return Err(CsvError::UnresolvedColumn((*field).to_string()));
            }
        }

        Ok(RecordReader {
            rows: self,
            headers,
            masked,
            records_read: 0,
            finished: false,
            _record: PhantomData,
        })
    }

    fn ensure_header(&mut self) -> CsvResult<()> {
        if self.header_ready {
            return Ok(());
        }
        self.header_ready = true;

        // Объявленный заголовок имеет приоритет: строка заголовка
        // потребляется из потока даже при заданных assumed_headers.
        if self.settings().has_header {
            if let Some(row) = self.parser.read_row()? {
                let names: Vec<String> =
                    row.into_iter().map(|field| field.unwrap_or_default()).collect();
                self.expected_width = Some(names.len());
                self.headers = Some(names);
            }
        } else if let Some(assumed) = self.settings().assumed_headers.clone() {
            self.expected_width = Some(assumed.len());
            self.headers = Some(assumed);
        }
        Ok(())
    }
}

impl<R: Read> Iterator for CsvReader<R> {
    type Item = CsvResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Потоковый reader типизированных записей.
///
/// Отображает каждую строку данных в значение `T` по именам колонок.
/// Под `ignore_errors` строка с непреобразуемым значением не
/// отбрасывается: проблемная колонка маскируется и строка
/// отображается заново, так что член получает значение по умолчанию
/// (члену нужен `#[serde(default)]`).
///
/// # Пример
///
/// ```
/// use std::io::Cursor;
/// use csvio::reader::CsvReader;
/// use csvio::settings::CsvSettings;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Account {
///     id: u64,
///     name: String,
/// }
///
/// let input = Cursor::new("id,name\n1,alice\n");
/// let reader = CsvReader::new(input, CsvSettings::default());
/// let accounts: Vec<Account> =
///     reader.into_records().unwrap().collect::<Result<_, _>>().unwrap();
/// assert_eq!(accounts[0].id, 1);
/// assert_eq!(accounts[0].name, "alice");
/// ```
pub struct RecordReader<R: Read, T> {
    rows: CsvReader<R>,
    headers: Vec<String>,
    /// Индексы колонок, исключённые из отображения на весь сеанс.
    masked: HashSet<usize>,
    /// Счётчик прочитанных записей.
    records_read: usize,
    finished: bool,
    _record: PhantomData<T>,
}

impl<R: Read, T: DeserializeOwned> RecordReader<R, T> {
    /// Имена колонок этого reader'а.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Возвращает количество прочитанных записей.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    fn deserialize_row(&self, row: &Row) -> CsvResult<T> {
        let mut masked = self.masked.clone();
        loop {
            match record::from_row_masked(&self.headers, row, &masked) {
                Ok(record) => return Ok(record),
                Err(err) if self.rows.settings().ignore_errors => {
                    let index = match &err {
                        CsvError::ValueConversion { index, .. } => Some(*index),
                        CsvError::NullNotPermitted { column } => {
                            self.headers.iter().position(|h| h == column)
                        }
                        _ => None,
                    };
                    // Маскируем проблемную колонку и повторяем
                    // отображение; немаскируемые ошибки фатальны.
                    match index {
                        Some(index) if masked.insert(index) => {}
                        _ => return Err(err),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R: Read, T: DeserializeOwned> Iterator for RecordReader<R, T> {
    type Item = CsvResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let row = match self.rows.read_row() {
            Ok(Some(row)) => row,
            Ok(None) => {
                self.finished = true;
                return None;
            }
            Err(err) => {
                self.finished = true;
                return Some(Err(err));
            }
        };
        match self.deserialize_row(&row) {
            Ok(record) => {
                self.records_read += 1;
                Some(Ok(record))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
