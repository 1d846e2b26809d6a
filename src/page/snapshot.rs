use std::sync::Mutex;

use scraper::{
    ElementRef,
    Html,
    Node,
    Selector,
};
use tokio::sync::{
    mpsc,
    watch,
};

use super::{
    Element,
    ElementPath,
    Page,
};
use crate::core::DuoSyncError;

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol",
    "p", "pre", "section", "table", "tr", "ul",
];

/// The latest serialized document pushed by the browser companion.
///
/// Every [`SnapshotPage::replace`] is one structural change.
pub struct SnapshotPage {
    source: Mutex<String>,
    revision: watch::Sender<u64>,
    #[cfg(test)]
    clicks: Mutex<Vec<ElementPath>>,
    click_sink: Mutex<Option<mpsc::UnboundedSender<ElementPath>>>,
}

impl SnapshotPage {
    pub fn new(html: impl Into<String>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            source: Mutex::new(html.into()),
            revision,
            #[cfg(test)]
            clicks: Mutex::new(Vec::new()),
            click_sink: Mutex::new(None),
        }
    }

    pub fn empty() -> Self {
        Self::new("<html><body></body></html>")
    }

    pub fn replace(&self, html: impl Into<String>) {
        *self.source.lock().unwrap() = html.into();
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Forward clicks to the browser companion. Without a sink a click only
    /// checks that its target still exists.
    pub fn set_click_sink(&self, sink: mpsc::UnboundedSender<ElementPath>) {
        *self.click_sink.lock().unwrap() = Some(sink);
    }

    #[cfg(test)]
    pub fn clicks(&self) -> Vec<ElementPath> {
        self.clicks.lock().unwrap().clone()
    }

    fn with_document<T>(&self, read: impl FnOnce(&Html) -> T) -> T {
        let source = self.source.lock().unwrap();
        let document = Html::parse_document(&source);
        read(&document)
    }
}

impl Page for SnapshotPage {
    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Some(parsed) = parse_selector(selector) else {
            return Vec::new();
        };
        self.with_document(|document| {
            document
                .select(&parsed)
                .enumerate()
                .map(|(index, found)| snapshot_element(found, ElementPath::root(selector, index)))
                .collect()
        })
    }

    fn query_within(&self, scope: &Element, selector: &str) -> Vec<Element> {
        let Some(parsed) = parse_selector(selector) else {
            return Vec::new();
        };
        self.with_document(|document| {
            let Some(scope_ref) = resolve(document, &scope.path) else {
                return Vec::new();
            };
            scope_ref
                .select(&parsed)
                .enumerate()
                .map(|(index, found)| snapshot_element(found, scope.path.child(selector, index)))
                .collect()
        })
    }

    fn click(&self, element: &Element) -> Result<(), DuoSyncError> {
        let exists = self.with_document(|document| resolve(document, &element.path).is_some());
        if !exists {
            return Err(DuoSyncError::missing(format!(
                "cannot click {:?}: element is gone",
                element.path
            )));
        }

        #[cfg(test)]
        self.clicks.lock().unwrap().push(element.path.clone());
        if let Some(sink) = self.click_sink.lock().unwrap().as_ref() {
            sink.send(element.path.clone())?;
        }
        Ok(())
    }

    fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("Invalid selector {:?}: {}", selector, e);
            None
        }
    }
}

fn resolve<'a>(document: &'a Html, path: &ElementPath) -> Option<ElementRef<'a>> {
    let mut current: Option<ElementRef<'a>> = None;
    for step in &path.steps {
        let selector = parse_selector(&step.selector)?;
        let found = match current {
            None => document.select(&selector).nth(step.index),
            Some(scope) => scope.select(&selector).nth(step.index),
        }?;
        current = Some(found);
    }
    current
}

fn snapshot_element(element: ElementRef<'_>, path: ElementPath) -> Element {
    let tag = element.value().name().to_string();
    let mut text = String::new();
    render_children(element, &mut text);

    let value = match tag.as_str() {
        "input" => Some(element.value().attr("value").unwrap_or_default().to_string()),
        "textarea" => Some(
            element.value().attr("value").map(str::to_string).unwrap_or_else(|| text.clone()),
        ),
        _ => None,
    };

    let attrs = element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    Element { path, tag, text: text.trim().to_string(), value, attrs }
}

fn render_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    render_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    match name {
        "br" => out.push('\n'),
        "input" => out.push_str(element.value().attr("value").unwrap_or_default()),
        "script" | "style" | "template" => {}
        _ => {
            let block = BLOCK_TAGS.contains(&name);
            if block && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            render_children(element, out);
            if block && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }
}
