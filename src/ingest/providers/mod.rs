pub mod browser;
pub mod page_html;
