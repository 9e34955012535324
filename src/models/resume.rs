//! 简历匹配相关的数据结构

use serde::{Deserialize, Deserializer, Serialize};

/// 一份待评估的简历
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeCandidate {
    /// 文件名，作为批次中的标识符
    pub name: String,
    pub text: String,
    /// 预先计算的相似度百分比（来自向量检索，可选）
    pub similarity: Option<f64>,
}

impl ResumeCandidate {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            similarity: None,
        }
    }

    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }
}

/// 把 L2 最近邻距离换算成相似度百分比，保留两位小数
pub fn similarity_from_distance(distance: f64) -> f64 {
    let similarity = (1.0 - distance.max(0.0).sqrt()).max(0.0) * 100.0;
    (similarity * 100.0).round() / 100.0
}

/// 模型返回的评估结果
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResumeAssessment {
    #[serde(rename = "Matched Percentage", deserialize_with = "de_percentage", default)]
    pub matched_percentage: f64,
    #[serde(rename = "Reason", deserialize_with = "de_text", default = "default_reason")]
    pub reason: String,
    #[serde(
        rename = "Skills To Improve",
        deserialize_with = "de_text",
        default = "default_skills"
    )]
    pub skills_to_improve: String,
    #[serde(
        rename = "Irrelevant",
        deserialize_with = "de_text",
        default = "default_irrelevant"
    )]
    pub irrelevant: String,
    #[serde(rename = "Keywords", deserialize_with = "de_text", default = "default_keywords")]
    pub keywords: String,
}

fn default_reason() -> String {
    "No reason provided.".to_string()
}

fn default_skills() -> String {
    "No suggestions.".to_string()
}

fn default_irrelevant() -> String {
    "No irrelevant content.".to_string()
}

fn default_keywords() -> String {
    "No matched keywords.".to_string()
}

/// 字符串或字符串列表，列表用 ", " 连接
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrList {
    Text(String),
    List(Vec<serde_json::Value>),
    Other(serde_json::Value),
}

fn de_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match TextOrList::deserialize(deserializer)? {
        TextOrList::Text(text) => text,
        TextOrList::List(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        TextOrList::Other(value) => value.to_string(),
    })
}

/// "85.5%" / "85.5" / 85.5 都接受
fn de_percentage<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => parse_percentage(&text).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid percentage: {text}"))
        }),
    }
}

/// 解析百分比字符串，NaN 和无穷大视为无效
pub fn parse_percentage(text: &str) -> Option<f64> {
    text.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// 排名后的一行结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResume {
    #[serde(rename = "Resume Number")]
    pub rank: usize,
    #[serde(rename = "Resume Name")]
    pub resume_name: String,
    #[serde(rename = "Matched Percentage", serialize_with = "ser_percentage")]
    pub matched_percentage: f64,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "Skills To Improve")]
    pub skills_to_improve: String,
    #[serde(rename = "Irrelevant")]
    pub irrelevant: String,
    #[serde(rename = "Matched Keywords")]
    pub matched_keywords: String,
    /// 该简历是否评估失败
    #[serde(skip)]
    pub failed: bool,
}

fn ser_percentage<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_percentage(*value))
}

pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_from_distance() {
        assert_eq!(similarity_from_distance(0.0), 100.0);
        assert_eq!(similarity_from_distance(0.25), 50.0);
        assert_eq!(similarity_from_distance(4.0), 0.0);
        assert_eq!(similarity_from_distance(0.1), 68.38);
    }

    #[test]
    fn test_assessment_with_string_fields() {
        let assessment: ResumeAssessment = serde_json::from_str(
            r#"{
                "Matched Percentage": "72.50%",
                "Reason": "Strong Rust background",
                "Skills To Improve": "Kubernetes",
                "Irrelevant": "N/A",
                "Keywords": "Rust, tokio"
            }"#,
        )
        .unwrap();
        assert_eq!(assessment.matched_percentage, 72.5);
        assert_eq!(assessment.keywords, "Rust, tokio");
    }

    #[test]
    fn test_assessment_with_lists_and_number() {
        let assessment: ResumeAssessment = serde_json::from_str(
            r#"{"Matched Percentage": 64, "Skills To Improve": ["AWS", "Terraform"], "Keywords": ["Rust", "SQL"]}"#,
        )
        .unwrap();
        assert_eq!(assessment.matched_percentage, 64.0);
        assert_eq!(assessment.skills_to_improve, "AWS, Terraform");
        assert_eq!(assessment.keywords, "Rust, SQL");
        assert_eq!(assessment.reason, "No reason provided.");
    }

    #[test]
    fn test_assessment_rejects_bad_percentage() {
        let result: Result<ResumeAssessment, _> =
            serde_json::from_str(r#"{"Matched Percentage": "high"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_percentage_rejects_non_finite() {
        assert_eq!(parse_percentage(" 85.5 % "), Some(85.5));
        assert_eq!(parse_percentage("NaN%"), None);
        assert_eq!(parse_percentage("inf"), None);
        assert_eq!(parse_percentage("-infinity%"), None);

        let result: Result<ResumeAssessment, _> =
            serde_json::from_str(r#"{"Matched Percentage": "NaN%"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_ranked_row_serializes_original_columns() {
        let row = RankedResume {
            rank: 1,
            resume_name: "alice.txt".to_string(),
            matched_percentage: 80.0,
            reason: "fit".to_string(),
            skills_to_improve: "N/A".to_string(),
            irrelevant: "N/A".to_string(),
            matched_keywords: "Rust".to_string(),
            failed: false,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Resume Number"], 1);
        assert_eq!(json["Matched Percentage"], "80.00%");
        assert!(json.get("failed").is_none());
    }
}
