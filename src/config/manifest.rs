use crate::core::{Member, NamespaceStore, Resolver, Strictness};
use crate::domain::{self, DomainMapping};
use crate::utils::error::{CarpeError, Result};
use crate::utils::validation::{self, Validate};
use crate::view::ViewOptions;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
});

/// 宣告式的命名空間內容，通常從 `carpe.toml` 讀取
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub resolver: ResolverConfig,
    #[serde(rename = "domain")]
    pub domains: Vec<DomainDecl>,
    #[serde(rename = "view")]
    pub views: Vec<ViewDecl>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub strict: bool,
}

impl ResolverConfig {
    pub fn strictness(&self) -> Strictness {
        if self.strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainDecl {
    pub namespace: String,
    pub name: String,
    pub parameters: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewDecl {
    pub namespace: String,
    pub name: String,
    pub el: Option<String>,
    pub template: Option<String>,
    #[serde(default)]
    pub ui: IndexMap<String, String>,
    #[serde(default)]
    pub events: IndexMap<String, String>,
}

impl ViewDecl {
    pub fn options(&self) -> ViewOptions {
        ViewOptions {
            name: Some(self.name.clone()),
            el: self.el.clone(),
            template: self.template.clone(),
            ui: self.ui.clone(),
            events: self.events.clone(),
        }
    }
}

impl Manifest {
    /// 從 TOML 檔案載入 manifest
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析 manifest
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let expanded = Self::substitute_env_vars(content);
        Ok(toml::from_str(&expanded)?)
    }

    /// 替換環境變數 (例如 ${CARPE_NAMESPACE})，未設定的變數保留原文
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
            })
            .into_owned()
    }

    /// 依設定的嚴格程度建立 `store` 的 resolver
    pub fn resolver(&self, store: &NamespaceStore) -> Resolver {
        Resolver::new(store.clone()).with_strictness(self.resolver.strictness())
    }

    /// 定義所有領域型別，並將每個視圖描述以 JSON 成員存入命名空間
    /// (需要時自動建立命名空間)
    pub fn load_into(&self, store: &NamespaceStore) -> Result<Resolver> {
        self.validate()?;
        let loader = Resolver::new(store.clone());

        for decl in &self.domains {
            let target = loader.namespace(&decl.namespace)?;
            let mapping = DomainMapping {
                parameters: decl.parameters.clone(),
            };
            domain::define(&target, &decl.name, &mapping);
        }

        for decl in &self.views {
            let target = loader.namespace(&decl.namespace)?;
            let options = serde_json::to_value(decl.options())?;
            target.insert(decl.name.clone(), Member::Value(options));
        }

        tracing::info!(
            domains = self.domains.len(),
            views = self.views.len(),
            "manifest loaded"
        );
        Ok(self.resolver(store))
    }
}

impl Validate for Manifest {
    /// 驗證 manifest 的合理性
    fn validate(&self) -> Result<()> {
        // 驗證領域型別宣告
        for (index, decl) in self.domains.iter().enumerate() {
            validation::validate_namespace_path(&format!("domain[{index}].namespace"), &decl.namespace)?;
            validation::validate_identifier(&format!("domain[{index}].name"), &decl.name)?;

            for (field, payload) in &decl.parameters {
                validation::validate_non_empty_string(
                    &format!("domain[{index}].parameters.{field}"),
                    payload,
                )?;
            }
            if let Some(duplicate) =
                validation::find_duplicate(decl.parameters.values().map(String::as_str))
            {
                tracing::warn!(
                    domain = %decl.name,
                    payload_key = duplicate,
                    "payload key declared twice, the last field wins"
                );
            }
        }

        // 驗證視圖宣告
        for (index, decl) in self.views.iter().enumerate() {
            validation::validate_namespace_path(&format!("view[{index}].namespace"), &decl.namespace)?;
            validation::validate_identifier(&format!("view[{index}].name"), &decl.name)?;
            validation::validate_either_set(&format!("view[{index}].el|template"), &decl.el, &decl.template)?;
        }

        // 同一命名空間下不可重複宣告
        let mut seen = std::collections::HashSet::new();
        for (namespace, name) in self
            .domains
            .iter()
            .map(|d| (&d.namespace, &d.name))
            .chain(self.views.iter().map(|v| (&v.namespace, &v.name)))
        {
            if !seen.insert((namespace, name)) {
                return Err(CarpeError::ConfigValidationError {
                    field: format!("{namespace}.{name}"),
                    message: "declared more than once".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BLOG: &str = r##"
[resolver]
strict = true

[[domain]]
namespace = "model.blog"
name = "Article"
parameters = { title = "t", content = "c" }

[[view]]
namespace = "view"
name = "ArticleView"
template = "#article-template"
ui = { title = ".title" }
events = { "click .btn" = "onClick" }
"##;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_toml_str(BLOG).unwrap();
        assert!(manifest.resolver.strict);
        assert_eq!(manifest.domains.len(), 1);
        let keys: Vec<_> = manifest.domains[0].parameters.keys().collect();
        assert_eq!(keys, ["title", "content"]);
        assert_eq!(manifest.views[0].options().events["click .btn"], "onClick");
    }

    #[test]
    fn test_empty_manifest_is_lenient() {
        let manifest = Manifest::from_toml_str("").unwrap();
        assert_eq!(manifest.resolver.strictness(), Strictness::Lenient);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_load_into_registers_members() {
        let manifest = Manifest::from_toml_str(BLOG).unwrap();
        let store = NamespaceStore::new();
        let resolver = manifest.load_into(&store).unwrap();

        assert_eq!(resolver.strictness(), Strictness::Strict);
        let article = resolver.resolve_path("model.blog.Article").unwrap();
        assert_eq!(article.as_domain().unwrap().name(), "Article");

        let view = resolver.resolve_path("view.ArticleView").unwrap();
        let options = ViewOptions::from_value(view.as_value().cloned().unwrap()).unwrap();
        assert_eq!(options.template.as_deref(), Some("#article-template"));
        assert_eq!(options.name.as_deref(), Some("ArticleView"));

        assert!(resolver.resolve_path("model.blg").is_err());
    }

    #[test]
    fn test_view_without_root_is_invalid() {
        let manifest = Manifest::from_toml_str(
            r#"
[[view]]
namespace = "view"
name = "Broken"
"#,
        )
        .unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_duplicate_declaration_is_invalid() {
        let manifest = Manifest::from_toml_str(
            r#"
[[domain]]
namespace = "model"
name = "Post"
parameters = { title = "t" }

[[domain]]
namespace = "model"
name = "Post"
parameters = { body = "b" }
"#,
        )
        .unwrap();
        assert!(matches!(
            manifest.validate(),
            Err(CarpeError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CARPE_TEST_NAMESPACE", "model.env");

        let manifest = Manifest::from_toml_str(
            r#"
[[domain]]
namespace = "${CARPE_TEST_NAMESPACE}"
name = "Post"
parameters = { title = "t", note = "${CARPE_TEST_UNSET_VARIABLE}" }
"#,
        )
        .unwrap();
        assert_eq!(manifest.domains[0].namespace, "model.env");
        assert_eq!(
            manifest.domains[0].parameters["note"],
            "${CARPE_TEST_UNSET_VARIABLE}"
        );

        std::env::remove_var("CARPE_TEST_NAMESPACE");
    }

    #[test]
    fn test_manifest_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BLOG.as_bytes()).unwrap();

        let manifest = Manifest::from_file(temp_file.path()).unwrap();
        assert_eq!(manifest.domains[0].name, "Article");
    }
}
