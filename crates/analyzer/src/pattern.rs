//! 의심 패턴 -- 공격 시도로 보이는 경로/메시지를 식별하는 규칙
//!
//! [`PatternSet`]은 순서가 있는 [`SuspiciousPattern`] 목록입니다.
//! 탐지기는 정해진 순서대로 규칙을 검사하고 처음 매칭된 규칙 하나만 사용합니다.
//!
//! 기본 세트 외에 YAML 파일에서 규칙 목록을 로드할 수 있습니다.
//!
//! # YAML 형식
//! ```yaml
//! - name: sql_injection
//!   pattern: "(?i)union\\s+select"
//!   description: SQL injection tokens
//! - name: path_traversal
//!   pattern: "\\.\\./"
//! ```

use std::collections::HashSet;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;

/// 패턴 파일 최대 크기
const MAX_PATTERN_FILE_SIZE: u64 = 1024 * 1024; // 1MB
/// 패턴 최대 개수
const MAX_PATTERNS_COUNT: usize = 1_000;
/// 패턴 이름 최대 길이
const MAX_PATTERN_NAME_LEN: usize = 128;
/// 컴파일된 정규식 크기 상한 (ReDoS/메모리 방지)
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// 기본 패턴 정의 (이름, 정규식, 설명). 순서가 곧 우선순위입니다.
const DEFAULT_PATTERNS: &[(&str, &str, &str)] = &[
    (
        "sql_injection",
        concat!(
            r#"(?i)(union(\s|\+|%20)+(all(\s|\+|%20)+)?select\b"#,
            r#"|\bselect(\s|\+|%20)+.+(\s|\+|%20)from\b"#,
            r#"|\bor(\s|\+|%20)+['"]?\d+['"]?(\s|\+|%20)*=(\s|\+|%20)*['"]?\d+"#,
            r#"|'(\s|\+|%20)*or(\s|\+|%20)*'"#,
            r#"|;(\s|%20)*drop(\s|\+|%20)+table\b"#,
            r#"|\bsleep(\s|%20)*\("#,
            r#"|%27(\s|\+|%20)*(or|and)\b)"#,
        ),
        "SQL injection tokens",
    ),
    (
        "path_traversal",
        r"(?i)(\.\./|\.\.\\|%2e%2e(/|%2f|%5c)|\.\.%2f|\.\.%5c)",
        "directory traversal sequences",
    ),
    (
        "xss_script_tag",
        r"(?i)(<\s*script|%3c\s*script|javascript:|\bon(error|load)\s*=)",
        "inline script tags",
    ),
    (
        "script_extension_query",
        r"(?i)\.(php|asp|aspx|jsp|cgi|pl)\?.*=",
        "script extension with query string",
    ),
];

/// YAML 패턴 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDefinition {
    /// 패턴 이름 (세트 내에서 유일)
    pub name: String,
    /// 정규식
    pub pattern: String,
    /// 설명
    #[serde(default)]
    pub description: String,
}

/// 컴파일된 의심 패턴
#[derive(Debug, Clone)]
pub struct SuspiciousPattern {
    name: String,
    description: String,
    regex: Regex,
}

impl SuspiciousPattern {
    /// 정의를 검증하고 컴파일합니다.
    pub fn compile(def: &PatternDefinition) -> Result<Self, AnalyzerError> {
        let invalid = |reason: String| AnalyzerError::PatternValidation {
            name: if def.name.is_empty() {
                "(empty)".to_owned()
            } else {
                def.name.clone()
            },
            reason,
        };

        if def.name.trim().is_empty() {
            return Err(invalid("pattern name must not be empty".to_owned()));
        }
        if def.name.len() > MAX_PATTERN_NAME_LEN {
            return Err(invalid(format!(
                "pattern name must not exceed {MAX_PATTERN_NAME_LEN} characters"
            )));
        }
        if def.pattern.is_empty() {
            return Err(invalid("pattern must not be empty".to_owned()));
        }

        let regex = RegexBuilder::new(&def.pattern)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| invalid(format!("invalid regex: {e}")))?;

        Ok(Self {
            name: def.name.clone(),
            description: def.description.clone(),
            regex,
        })
    }

    /// 패턴 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 패턴 설명
    pub fn description(&self) -> &str {
        &self.description
    }

    /// 원본 정규식 문자열
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// 텍스트가 패턴에 매칭되는지 확인합니다.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// 순서가 있는 의심 패턴 세트
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<SuspiciousPattern>,
}

impl PatternSet {
    /// 정의 목록에서 세트를 생성합니다.
    ///
    /// 이름 중복, 빈 이름, 컴파일 불가 정규식, 개수 초과는 에러입니다.
    pub fn from_definitions(defs: &[PatternDefinition]) -> Result<Self, AnalyzerError> {
        if defs.len() > MAX_PATTERNS_COUNT {
            return Err(AnalyzerError::PatternValidation {
                name: "(set)".to_owned(),
                reason: format!("too many patterns: max {MAX_PATTERNS_COUNT}"),
            });
        }

        let mut seen = HashSet::new();
        let mut patterns = Vec::with_capacity(defs.len());
        for def in defs {
            if !seen.insert(def.name.as_str()) {
                return Err(AnalyzerError::PatternValidation {
                    name: def.name.clone(),
                    reason: "duplicate pattern name".to_owned(),
                });
            }
            patterns.push(SuspiciousPattern::compile(def)?);
        }

        Ok(Self { patterns })
    }

    /// 기본 정의 목록
    pub fn default_definitions() -> Vec<PatternDefinition> {
        DEFAULT_PATTERNS
            .iter()
            .map(|(name, pattern, description)| PatternDefinition {
                name: (*name).to_owned(),
                pattern: (*pattern).to_owned(),
                description: (*description).to_owned(),
            })
            .collect()
    }

    /// YAML 문자열을 파싱하여 세트를 생성합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<Self, AnalyzerError> {
        let defs: Vec<PatternDefinition> =
            serde_yaml::from_str(yaml_str).map_err(|e| AnalyzerError::PatternLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        if defs.is_empty() {
            return Err(AnalyzerError::PatternLoad {
                path: source.to_owned(),
                reason: "pattern file contains no patterns".to_owned(),
            });
        }

        Self::from_definitions(&defs)
    }

    /// YAML 파일에서 세트를 로드합니다.
    ///
    /// # Errors
    /// - 파일을 읽을 수 없거나 크기 제한을 넘는 경우
    /// - YAML 파싱 또는 패턴 검증에 실패한 경우
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        let load_err = |reason: String| AnalyzerError::PatternLoad {
            path: path.display().to_string(),
            reason,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| load_err(format!("failed to read file metadata: {e}")))?;
        if metadata.len() > MAX_PATTERN_FILE_SIZE {
            return Err(load_err(format!(
                "file too large: {} bytes (max: {MAX_PATTERN_FILE_SIZE})",
                metadata.len()
            )));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| load_err(format!("failed to read file: {e}")))?;

        let set = Self::parse_yaml(&content, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            count = set.len(),
            "loaded suspicious patterns"
        );
        Ok(set)
    }

    /// 처음 매칭되는 패턴을 반환합니다.
    ///
    /// 각 패턴마다 후보 텍스트를 순서대로 검사합니다.
    pub fn first_match<'a>(&self, candidates: &[&'a str]) -> Option<(&SuspiciousPattern, &'a str)> {
        self.patterns.iter().find_map(|pattern| {
            candidates
                .iter()
                .find(|text| pattern.is_match(text))
                .map(|text| (pattern, *text))
        })
    }

    /// 패턴 목록
    pub fn patterns(&self) -> &[SuspiciousPattern] {
        &self.patterns
    }

    /// 패턴 수
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// 세트가 비었는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PatternSet {
    /// 기본 패턴 세트: sql_injection, path_traversal, xss_script_tag, script_extension_query
    fn default() -> Self {
        let patterns = Self::default_definitions()
            .iter()
            .filter_map(|def| match SuspiciousPattern::compile(def) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::error!(pattern = %def.name, error = %e, "built-in pattern failed to compile");
                    None
                }
            })
            .collect();
        Self { patterns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &PatternSet) -> Vec<&str> {
        set.patterns().iter().map(|p| p.name()).collect()
    }

    #[test]
    fn default_set_order_is_fixed() {
        let set = PatternSet::default();
        assert_eq!(
            names(&set),
            vec![
                "sql_injection",
                "path_traversal",
                "xss_script_tag",
                "script_extension_query"
            ]
        );
    }

    #[test]
    fn default_definitions_all_compile() {
        let set = PatternSet::from_definitions(&PatternSet::default_definitions()).unwrap();
        assert_eq!(set.len(), DEFAULT_PATTERNS.len());
    }

    #[test]
    fn default_set_flags_known_attacks() {
        let set = PatternSet::default();
        let cases = [
            ("/search?q=1' OR '1'='1", "sql_injection"),
            ("/items?id=1 UNION SELECT password FROM users", "sql_injection"),
            ("/items?id=1%20UNION%20ALL%20SELECT%20NULL", "sql_injection"),
            ("/admin/../../../etc/passwd", "path_traversal"),
            ("/static/%2e%2e%2fetc/passwd", "path_traversal"),
            ("/comment?text=<script>alert(1)</script>", "xss_script_tag"),
            ("/wp-login.php?action=register", "script_extension_query"),
        ];
        for (path, expected) in cases {
            let (pattern, matched) = set.first_match(&[path]).unwrap();
            assert_eq!(pattern.name(), expected, "path: {path}");
            assert_eq!(matched, path);
        }
    }

    #[test]
    fn benign_paths_do_not_match() {
        let set = PatternSet::default();
        for path in ["/", "/index.html", "/api/v1/users/42", "/images/logo.png", "/index.php"] {
            assert!(set.first_match(&[path]).is_none(), "path: {path}");
        }
    }

    #[test]
    fn first_match_checks_path_before_message() {
        let set = PatternSet::default();
        let (pattern, text) = set
            .first_match(&["/a/../b", "GET /a/../b HTTP/1.1"])
            .unwrap();
        assert_eq!(pattern.name(), "path_traversal");
        assert_eq!(text, "/a/../b");
    }

    #[test]
    fn first_rule_wins_when_several_match() {
        let set = PatternSet::default();
        let (pattern, _) = set
            .first_match(&["/x.php?id=1 union select 1 from t/../"])
            .unwrap();
        assert_eq!(pattern.name(), "sql_injection");
    }

    #[test]
    fn parse_valid_yaml() {
        let yaml = r#"
- name: wp_admin
  pattern: "^/wp-admin"
  description: WordPress admin probing
- name: env_file
  pattern: "/\\.env$"
"#;
        let set = PatternSet::parse_yaml(yaml, "test.yml").unwrap();
        assert_eq!(names(&set), vec!["wp_admin", "env_file"]);
        assert_eq!(set.patterns()[1].description(), "");
        assert!(set.first_match(&["/app/.env"]).is_some());
    }

    #[test]
    fn parse_invalid_yaml_returns_load_error() {
        let err = PatternSet::parse_yaml("not: [valid: yaml: {{{", "bad.yml").unwrap_err();
        assert!(matches!(err, AnalyzerError::PatternLoad { .. }));
    }

    #[test]
    fn parse_empty_list_is_rejected() {
        let err = PatternSet::parse_yaml("[]", "empty.yml").unwrap_err();
        assert!(matches!(err, AnalyzerError::PatternLoad { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let yaml = r#"
- name: dup
  pattern: "a"
- name: dup
  pattern: "b"
"#;
        let err = PatternSet::parse_yaml(yaml, "dup.yml").unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let def = PatternDefinition {
            name: "broken".to_owned(),
            pattern: "(unclosed".to_owned(),
            description: String::new(),
        };
        let err = SuspiciousPattern::compile(&def).unwrap_err();
        assert!(matches!(err, AnalyzerError::PatternValidation { .. }));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let def = PatternDefinition {
            name: " ".to_owned(),
            pattern: "a".to_owned(),
            description: String::new(),
        };
        assert!(SuspiciousPattern::compile(&def).is_err());
    }

    #[tokio::test]
    async fn load_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.yml");
        tokio::fs::write(&path, "- name: probe\n  pattern: \"^/cgi-bin/\"\n")
            .await
            .unwrap();
        let set = PatternSet::load_file(&path).await.unwrap();
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn load_nonexistent_file_returns_error() {
        let err = PatternSet::load_file("/nonexistent/patterns.yml")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::PatternLoad { .. }));
    }
}
