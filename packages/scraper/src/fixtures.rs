//! Catalog page fixtures for tests.
//!
//! Generates listing pages shaped like `books.toscrape.com`: a breadcrumb
//! trail, `article.product_pod` items, and a pager with a `next` link.

use std::fmt::Write as _;

use crate::static_site::FixturePages;

/// Base URL fixture sites are served from.
pub const FIXTURE_ROOT: &str = "http://books.toscrape.com/";

/// One item container. `None` fields omit the corresponding element.
#[derive(Debug, Clone)]
pub struct FixtureItem {
    pub title: Option<String>,
    pub price: Option<String>,
    pub rating_class: Option<String>,
    pub availability: Option<String>,
}

impl FixtureItem {
    /// A fully populated item.
    #[must_use]
    pub fn book(title: &str, price: &str, rating: &str, availability: &str) -> Self {
        Self {
            title: Some(title.to_owned()),
            price: Some(price.to_owned()),
            rating_class: Some(format!("star-rating {rating}")),
            availability: Some(availability.to_owned()),
        }
    }

    fn write_html(&self, out: &mut String) {
        out.push_str("<li><article class=\"product_pod\">");
        out.push_str("<div class=\"image_container\"><img src=\"cover.jpg\" alt=\"\"></div>");
        if let Some(rating) = &self.rating_class {
            let _ = write!(out, "<p class=\"{}\"><i class=\"icon-star\"></i></p>", escape(rating));
        }
        if let Some(title) = &self.title {
            let _ = write!(
                out,
                "<h3><a href=\"book.html\" title=\"{}\">{}</a></h3>",
                escape(title),
                escape(&truncate(title)),
            );
        }
        out.push_str("<div class=\"product_price\">");
        if let Some(price) = &self.price {
            let _ = write!(out, "<p class=\"price_color\">{}</p>", escape(price));
        }
        if let Some(availability) = &self.availability {
            let _ = write!(
                out,
                "<p class=\"instock availability\"><i class=\"icon-ok\"></i>\n    {}\n</p>",
                escape(availability),
            );
        }
        out.push_str("</div></article></li>");
    }
}

/// One listing page.
#[derive(Debug, Clone, Default)]
pub struct FixturePage {
    /// Breadcrumb entries; the last one is rendered as the active entry
    /// without a link. Empty omits the trail.
    pub breadcrumb: Vec<String>,
    pub items: Vec<FixtureItem>,
    /// Target of the `next` link. `None` omits the control.
    pub next_href: Option<String>,
}

impl FixturePage {
    /// Renders the page as a complete HTML document.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html><html><head><title>Catalog</title></head><body>");
        if !self.breadcrumb.is_empty() {
            out.push_str("<ul class=\"breadcrumb\">");
            let last = self.breadcrumb.len() - 1;
            for (i, entry) in self.breadcrumb.iter().enumerate() {
                if i == last {
                    let _ = write!(out, "<li class=\"active\">{}</li>", escape(entry));
                } else {
                    let _ = write!(out, "<li>\n  <a href=\"index.html\">{}</a>\n</li>", escape(entry));
                }
            }
            out.push_str("</ul>");
        }
        out.push_str("<section><ol class=\"row\">");
        for item in &self.items {
            item.write_html(&mut out);
        }
        out.push_str("</ol>");
        if let Some(href) = &self.next_href {
            let _ = write!(
                out,
                "<ul class=\"pager\"><li class=\"next\"><a href=\"{}\">next</a></li></ul>",
                escape(href),
            );
        }
        out.push_str("</section></body></html>");
        out
    }
}

/// URL of listing page `page` (1-based) under [`FIXTURE_ROOT`].
#[must_use]
pub fn page_url(page: usize) -> String {
    if page == 1 {
        FIXTURE_ROOT.to_owned()
    } else {
        format!("{FIXTURE_ROOT}catalogue/page-{page}.html")
    }
}

/// Relative `next` href from page `page` to page `page + 1`.
fn next_href(page: usize) -> String {
    if page == 1 {
        "catalogue/page-2.html".to_owned()
    } else {
        format!("page-{}.html", page + 1)
    }
}

/// Builds a site of `pages` listing pages with `items_per_page` books each.
///
/// Every page, including the last, links to the following page, so a run
/// over it only stops at its page limit or on a missing page. Page 1 has
/// no breadcrumb; later pages carry `Home > {category} > Page n`.
#[must_use]
pub fn catalog_site(pages: usize, items_per_page: usize, category: &str) -> FixturePages {
    let mut site = FixturePages::new();
    for page in 1..=pages {
        let fixture = FixturePage {
            breadcrumb: if page == 1 {
                Vec::new()
            } else {
                vec!["Home".to_owned(), category.to_owned(), format!("Page {page}")]
            },
            items: (1..=items_per_page)
                .map(|i| {
                    FixtureItem::book(
                        &format!("Book {page}-{i}"),
                        &format!("£{}.{:02}", 10 + i, page),
                        "Three",
                        "In stock (22 available)",
                    )
                })
                .collect(),
            next_href: Some(next_href(page)),
        };
        site = site.with_page(&page_url(page), fixture.to_html());
    }
    site
}

fn truncate(title: &str) -> String {
    if title.chars().count() > 20 {
        format!("{}...", title.chars().take(17).collect::<String>())
    } else {
        title.to_owned()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
