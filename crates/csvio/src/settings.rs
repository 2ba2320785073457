//! Настройки диалекта CSV.
//!
//! [`CsvSettings`] описывает диалект (разделитель, квалификатор,
//! терминатор строки) и политики обработки (заголовок, null-значения,
//! терпимость к ошибкам). Настройки неизменяемы после создания:
//! каждая сессия чтения/записи владеет своей копией и никогда
//! не мутирует её.

/// Разделитель по умолчанию.
pub const DEFAULT_DELIMITER: char = ',';

/// Квалификатор текста по умолчанию.
pub const DEFAULT_QUALIFIER: char = '"';

/// Терминатор строки по умолчанию (платформенный).
#[cfg(windows)]
pub const DEFAULT_LINE_SEPARATOR: &str = "\r\n";
/// Терминатор строки по умолчанию (платформенный).
#[cfg(not(windows))]
pub const DEFAULT_LINE_SEPARATOR: &str = "\n";

/// Конфигурация диалекта и политик CSV-кодека.
///
/// Все поля публичны; для цепочечной настройки есть `with_*` хелперы.
///
/// # Пример
///
/// ```
/// use csvio::settings::CsvSettings;
///
/// let settings = CsvSettings::default()
///     .with_delimiter(';')
///     .with_allow_null("NULL");
///
/// assert_eq!(settings.delimiter, ';');
/// assert!(settings.allow_null);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSettings {
    /// Разделитель полей. По умолчанию `','`.
    pub delimiter: char,

    /// Квалификатор для полей со спецсимволами. По умолчанию `'"'`.
    /// `None` полностью отключает закавычивание.
    pub qualifier: Option<char>,

    /// Терминатор строки при записи. По умолчанию платформенный.
    /// При чтении `\n` и `\r\n` принимаются всегда, независимо от
    /// настроенного значения.
    pub line_separator: String,

    /// Содержит ли поток строку заголовка. По умолчанию `true`.
    pub has_header: bool,

    /// Имена колонок для потоков без строки заголовка.
    pub assumed_headers: Option<Vec<String>>,

    /// Пропускать восстановимые ошибки структуры и данных вместо
    /// возврата ошибки (см. политику в документации крейта).
    pub ignore_errors: bool,

    /// Распознавать null-метку при чтении и записывать `None` как метку.
    pub allow_null: bool,

    /// Текстовая метка null-значения. Учитывается только при
    /// `allow_null` и только для незакавыченных полей.
    pub null_sentinel: String,

    /// Обрезать краевые пробелы незакавыченных полей при чтении и
    /// закавычивать поля с краевыми пробелами при записи.
    pub trim_whitespace: bool,
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            qualifier: Some(DEFAULT_QUALIFIER),
            line_separator: DEFAULT_LINE_SEPARATOR.to_string(),
            has_header: true,
            assumed_headers: None,
            ignore_errors: false,
            allow_null: false,
            null_sentinel: String::new(),
            trim_whitespace: false,
        }
    }
}

impl CsvSettings {
    /// Настройки по умолчанию: `,` / `"` / платформенный терминатор,
    /// заголовок присутствует, все политики выключены.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Заменяет разделитель полей.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Заменяет квалификатор текста.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: char) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// Полностью отключает закавычивание.
    #[must_use]
    pub fn without_qualifier(mut self) -> Self {
        self.qualifier = None;
        self
    }

    /// Заменяет терминатор строки для записи.
    #[must_use]
    pub fn with_line_separator(mut self, separator: impl Into<String>) -> Self {
        self.line_separator = separator.into();
        self
    }

    /// Объявляет, что строки заголовка в потоке нет, и задаёт
    /// предполагаемые имена колонок.
    #[must_use]
    pub fn with_assumed_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.has_header = false;
        self.assumed_headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Объявляет, что строки заголовка в потоке нет (и имена колонок
    /// неизвестны — типизированное чтение будет недоступно).
    #[must_use]
    pub fn without_header(mut self) -> Self {
        self.has_header = false;
        self
    }

    /// Включает терпимость к восстановимым ошибкам.
    #[must_use]
    pub fn with_ignore_errors(mut self) -> Self {
        self.ignore_errors = true;
        self
    }

    /// Включает null-обработку с заданной меткой.
    #[must_use]
    pub fn with_allow_null(mut self, sentinel: impl Into<String>) -> Self {
        self.allow_null = true;
        self.null_sentinel = sentinel.into();
        self
    }

    /// Включает обрезку краевых пробелов.
    #[must_use]
    pub fn with_trim_whitespace(mut self) -> Self {
        self.trim_whitespace = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = CsvSettings::default();
        assert_eq!(s.delimiter, ',');
        assert_eq!(s.qualifier, Some('"'));
        assert!(s.has_header);
        assert!(s.assumed_headers.is_none());
        assert!(!s.ignore_errors);
        assert!(!s.allow_null);
        assert!(!s.trim_whitespace);
    }

    #[test]
    fn test_builder_chain() {
        let s = CsvSettings::new()
            .with_delimiter('\t')
            .with_qualifier('\'')
            .with_line_separator("\r\n")
            .with_ignore_errors()
            .with_allow_null("NULL")
            .with_trim_whitespace();

        assert_eq!(s.delimiter, '\t');
        assert_eq!(s.qualifier, Some('\''));
        assert_eq!(s.line_separator, "\r\n");
        assert!(s.ignore_errors);
        assert!(s.allow_null);
        assert_eq!(s.null_sentinel, "NULL");
        assert!(s.trim_whitespace);
    }

    #[test]
    fn test_assumed_headers_disable_header_row() {
        let s = CsvSettings::new().with_assumed_headers(["a", "b"]);
        assert!(!s.has_header);
        assert_eq!(s.assumed_headers, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
