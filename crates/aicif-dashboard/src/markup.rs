/// HTML fragments that are escaped by construction.
///
/// A `Markup` value is either a trusted template literal or built by the [`html!`] macro,
/// which escapes every interpolated argument that is not itself `Markup`.
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Only for template output produced by [`html!`].
    #[doc(hidden)]
    pub fn trusted(html: String) -> Self {
        Self(html)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn push(&mut self, other: &Markup) {
        self.0.push_str(&other.0);
    }
}

impl FromIterator<Markup> for Markup {
    fn from_iter<I: IntoIterator<Item = Markup>>(iter: I) -> Self {
        let mut out = Markup::empty();
        for m in iter {
            out.push(&m);
        }
        out
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// How a template argument is written into the output.
pub trait Render {
    fn render_to(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl Render for str {
    fn render_to(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape(self))
    }
}

impl Render for String {
    fn render_to(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().render_to(f)
    }
}

impl Render for Markup {
    fn render_to(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<T: Render + ?Sized> Render for &T {
    fn render_to(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).render_to(f)
    }
}

#[doc(hidden)]
pub struct Rendered<'a, T: ?Sized>(pub &'a T);

impl<T: Render + ?Sized> fmt::Display for Rendered<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.render_to(f)
    }
}

/// `format!` for HTML: strings are escaped, `Markup` is inserted as-is.
macro_rules! html {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::markup::Markup::trusted(format!(
            $fmt $(, $crate::markup::Rendered(&$arg))*
        ))
    };
}

pub(crate) use html;
