use std::sync::Arc;

use shared::protocol::PageContent;
use thiserror::Error;

pub const NOTHING_TO_DISPLAY: &str = "(Nothing to display)";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("page {index} out of range for {len} pages")]
    OutOfRange { index: usize, len: usize },
    #[error("failed to render page {index}: {reason}")]
    Content { index: usize, reason: String },
}

/// Produces the display-ready view of one page of an immutable page set.
pub trait PageSource: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn render(&self, index: usize) -> Result<PageContent, RenderError>;

    /// Static content sent in place of a session when there is nothing to page.
    fn empty_view(&self) -> PageContent {
        PageContent::new(String::new(), NOTHING_TO_DISPLAY)
    }
}

impl<P: PageSource + ?Sized> PageSource for Arc<P> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn render(&self, index: usize) -> Result<PageContent, RenderError> {
        (**self).render(index)
    }

    fn empty_view(&self) -> PageContent {
        (**self).empty_view()
    }
}

impl<P: PageSource + ?Sized> PageSource for Box<P> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn render(&self, index: usize) -> Result<PageContent, RenderError> {
        (**self).render(index)
    }

    fn empty_view(&self) -> PageContent {
        (**self).empty_view()
    }
}

pub fn page_count(items: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    items.div_ceil(per_page)
}

/// Groups text lines `per_page` at a time under a "Page X of Y" header.
#[derive(Debug, Clone)]
pub struct LinePageSource {
    title: String,
    pages: Vec<Vec<String>>,
}

impl LinePageSource {
    pub fn new(title: impl Into<String>, items: Vec<String>, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let mut pages = Vec::with_capacity(page_count(items.len(), per_page));
        let mut items = items.into_iter().peekable();
        while items.peek().is_some() {
            pages.push(items.by_ref().take(per_page).collect());
        }
        Self {
            title: title.into(),
            pages,
        }
    }
}

impl PageSource for LinePageSource {
    fn len(&self) -> usize {
        self.pages.len()
    }

    fn render(&self, index: usize) -> Result<PageContent, RenderError> {
        let lines = self.pages.get(index).ok_or(RenderError::OutOfRange {
            index,
            len: self.pages.len(),
        })?;
        let mut description = format!("**Page {} of {}**\n", index + 1, self.pages.len());
        for line in lines {
            description.push('\n');
            description.push_str(line);
        }
        Ok(PageContent::new(self.title.clone(), description))
    }

    fn empty_view(&self) -> PageContent {
        PageContent::new(self.title.clone(), NOTHING_TO_DISPLAY)
    }
}

type ItemFormatter<T> = dyn Fn(&T) -> Result<String, String> + Send + Sync;

/// One item per page, formatted on demand. A formatter error surfaces as
/// [`RenderError::Content`] for that page only.
pub struct ItemPageSource<T> {
    title: String,
    items: Vec<T>,
    format: Box<ItemFormatter<T>>,
}

impl<T> ItemPageSource<T> {
    pub fn new<F>(title: impl Into<String>, items: Vec<T>, format: F) -> Self
    where
        F: Fn(&T) -> Result<String, String> + Send + Sync + 'static,
    {
        Self {
            title: title.into(),
            items,
            format: Box::new(format),
        }
    }
}

impl<T: Send + Sync> PageSource for ItemPageSource<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn render(&self, index: usize) -> Result<PageContent, RenderError> {
        let item = self.items.get(index).ok_or(RenderError::OutOfRange {
            index,
            len: self.items.len(),
        })?;
        let body =
            (self.format)(item).map_err(|reason| RenderError::Content { index, reason })?;
        Ok(PageContent::new(
            self.title.clone(),
            format!("Page {} of {}\n\n{body}", index + 1, self.items.len()),
        ))
    }

    fn empty_view(&self) -> PageContent {
        PageContent::new(self.title.clone(), NOTHING_TO_DISPLAY)
    }
}
