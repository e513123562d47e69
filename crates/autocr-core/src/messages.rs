//! Locale-keyed message catalogs for rule descriptions and report labels.
//!
//! The engine threads a [`MessageCatalog`] through every rule context and
//! reporter instead of consulting process-global state, so two scans with
//! different locales can coexist in one process.

/// Report language. The default matches the original deployment audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Zh,
    En,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Zh => "zh",
            Locale::En => "en",
        }
    }

    /// Parse a locale tag such as `zh`, `zh-CN`, `en_US`. Unknown tags fall
    /// back to `None` so callers can apply their own default.
    pub fn parse(tag: &str) -> Option<Self> {
        let lower = tag.to_lowercase();
        let lang = lower.split(['-', '_']).next().unwrap_or(&lower);
        match lang {
            "zh" => Some(Locale::Zh),
            "en" => Some(Locale::En),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MessageCatalog {
    locale: Locale,
}

impl MessageCatalog {
    pub fn for_locale(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Look up a message by key. Unknown keys return the key itself so a
    /// missing entry is visible in output rather than silently dropped.
    pub fn get(&self, key: &str) -> &'static str {
        let table = match self.locale {
            Locale::Zh => ZH,
            Locale::En => EN,
        };
        table
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or_else(|| {
                EN.iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| *v)
                    .unwrap_or("<missing message>")
            })
    }

    /// Look up a template and substitute `{name}` placeholders.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut out = self.get(key).to_string();
        for (name, value) in args {
            out = out.replace(&format!("{{{name}}}"), value);
        }
        out
    }
}

const EN: &[(&str, &str)] = &[
    (
        "rule.deep-relative-imports.message",
        "Relative import '{specifier}' climbs {depth} directory levels, which makes the module layout fragile",
    ),
    (
        "rule.deep-relative-imports.suggestion.alias",
        "Configure a path alias in tsconfig.json (e.g. '@/...') and import through it",
    ),
    (
        "rule.deep-relative-imports.suggestion.aggregate",
        "Re-export the shared module from a nearby index file and import from there",
    ),
    (
        "rule.circular-dependencies.message",
        "Circular dependency detected: {chain}",
    ),
    (
        "rule.circular-dependencies.suggestion",
        "Break the cycle by extracting the shared pieces into a module both sides can import",
    ),
    (
        "rule.circular-dependencies.unresolved",
        "Import '{specifier}' matched an alias or workspace rule but no file could be resolved",
    ),
    (
        "rule.swallowed-errors.message",
        "This try statement swallows errors: neither catch nor finally contains executable statements",
    ),
    (
        "rule.swallowed-errors.suggestion",
        "Handle the error, rethrow it, or at least record it before discarding",
    ),
    (
        "rule.catastrophic-regex.message",
        "Regular expression '{pattern}' contains nested unbounded quantifiers and may backtrack catastrophically on a hot path",
    ),
    (
        "rule.catastrophic-regex.suggestion",
        "Rewrite the pattern without nesting '+'/'*' quantifiers, or hoist the match out of the loop",
    ),
    (
        "rule.deep-clone-in-loop.message",
        "Deep clone '{code}' runs on a hot path; cloning per iteration is expensive",
    ),
    (
        "rule.deep-clone-in-loop.suggestion",
        "Clone once outside the loop, or copy only the fields that actually change",
    ),
    (
        "rule.n2-array-lookup.message",
        "Linear array search '{method}' on a hot path turns the surrounding loop quadratic",
    ),
    (
        "rule.n2-array-lookup.suggestion",
        "Build a Map or Set keyed by the lookup value before the loop and query that instead",
    ),
    ("report.file", "File"),
    ("report.description", "Description"),
    ("report.code", "Code"),
    ("report.suggestion", "Suggestion"),
    ("report.suggestion_separator", "; "),
    ("report.tag.base", "base"),
    ("report.tag.performance", "performance"),
    ("report.tag.untagged", "general"),
];

const ZH: &[(&str, &str)] = &[
    (
        "rule.deep-relative-imports.message",
        "相对导入 '{specifier}' 向上跨越了 {depth} 层目录，目录结构一旦调整就会失效",
    ),
    (
        "rule.deep-relative-imports.suggestion.alias",
        "在 tsconfig.json 中配置路径别名（例如 '@/...'）并通过别名导入",
    ),
    (
        "rule.deep-relative-imports.suggestion.aggregate",
        "在就近的 index 文件中聚合导出该模块，再从聚合入口导入",
    ),
    ("rule.circular-dependencies.message", "检测到循环依赖：{chain}"),
    (
        "rule.circular-dependencies.suggestion",
        "将公共部分抽取到双方都可以依赖的独立模块，打破循环",
    ),
    (
        "rule.circular-dependencies.unresolved",
        "导入 '{specifier}' 命中了别名或 workspace 规则，但未能解析到任何文件",
    ),
    (
        "rule.swallowed-errors.message",
        "该 try 语句吞掉了错误：catch 与 finally 中均没有可执行语句",
    ),
    (
        "rule.swallowed-errors.suggestion",
        "处理错误、重新抛出，或至少在丢弃之前记录它",
    ),
    (
        "rule.catastrophic-regex.message",
        "正则表达式 '{pattern}' 存在嵌套的无界量词，在热点路径上可能触发灾难性回溯",
    ),
    (
        "rule.catastrophic-regex.suggestion",
        "改写模式以避免嵌套 '+'/'*' 量词，或将匹配移出循环",
    ),
    (
        "rule.deep-clone-in-loop.message",
        "深拷贝 '{code}' 位于热点路径，每次迭代都执行深拷贝开销很大",
    ),
    (
        "rule.deep-clone-in-loop.suggestion",
        "在循环外拷贝一次，或仅复制真正会变化的字段",
    ),
    (
        "rule.n2-array-lookup.message",
        "热点路径上的线性查找 '{method}' 会让外层循环的复杂度变为平方级",
    ),
    (
        "rule.n2-array-lookup.suggestion",
        "在循环之前以查找键构建 Map 或 Set，改为常数时间查询",
    ),
    ("report.file", "文件"),
    ("report.description", "描述"),
    ("report.code", "代码"),
    ("report.suggestion", "建议"),
    ("report.suggestion_separator", "；"),
    ("report.tag.base", "基础"),
    ("report.tag.performance", "性能"),
    ("report.tag.untagged", "通用"),
];
