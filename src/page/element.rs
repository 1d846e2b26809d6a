use serde::{
    Deserialize,
    Serialize,
};

/// One hop of an [`ElementPath`]: the `index`-th match of `selector` inside the previous hop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    pub selector: String,
    pub index: usize,
}

/// Locates an element by re-running the queries that found it, so the same
/// node can be found again in a later snapshot or by the browser companion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPath {
    pub steps: Vec<PathStep>,
}

impl ElementPath {
    pub fn root(selector: &str, index: usize) -> Self {
        Self { steps: vec![PathStep { selector: selector.to_string(), index }] }
    }

    pub fn child(&self, selector: &str, index: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep { selector: selector.to_string(), index });
        Self { steps }
    }
}

/// Owned snapshot of a matched node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub path: ElementPath,
    pub tag: String,
    /// Rendered text, close to the browser's `innerText`.
    pub text: String,
    /// Current value of `input` and `textarea` elements.
    pub value: Option<String>,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Lower-cased, trimmed text, the form used for text-matching watch conditions.
    pub fn normalized_text(&self) -> String {
        self.text.trim().to_lowercase()
    }
}
