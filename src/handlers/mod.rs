mod mapping;

pub use mapping::{
    create_handler, list_handler, probe_handler, public_create_handler, redirect_handler,
    render_html, render_text, short_url, ListingFormat,
};
