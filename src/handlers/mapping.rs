use actix_web::{
    http::header::{ContentType, ACCEPT, LOCATION},
    web, HttpRequest, HttpResponse, Responder,
};
use log::{debug, info};
use validator::Validate;

use crate::{
    config::Config,
    models::{CreateMappingDto, CreateMappingResponse, Mapping},
    services::{SharedShortenerService, Shortened, ShortenerServiceTrait},
    types::Result,
};

/// Shapes the listing can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFormat {
    Html,
    Json,
    Text,
}

impl ListingFormat {
    /// Picks a format from an `Accept` header value; HTML wins over JSON.
    pub fn negotiate(accept: Option<&str>) -> Self {
        let accept = accept.unwrap_or_default().to_ascii_lowercase();
        if accept.contains("text/html") {
            ListingFormat::Html
        } else if accept.contains("application/json") {
            ListingFormat::Json
        } else {
            ListingFormat::Text
        }
    }
}

/// Absolute URL under which `code` is served.
///
/// Uses `PUBLIC_BASE_URL` when configured, otherwise the scheme and host
/// the request came in on.
pub fn short_url(req: &HttpRequest, config: &Config, code: &str) -> String {
    match &config.server.public_base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), code),
        None => {
            let info = req.connection_info();
            format!("{}://{}/{}", info.scheme(), info.host(), code)
        }
    }
}

async fn shorten(
    dto: CreateMappingDto,
    service: &SharedShortenerService,
) -> Result<Shortened> {
    dto.validate()?;
    let shortened = service.create(&dto.url, dto.code.as_deref()).await?;
    Ok(shortened)
}

/// Create mapping route handler
///
/// Accepts a form or a JSON body. JSON callers get a JSON body back,
/// everybody else the bare short URL.
pub async fn create_handler(
    req: HttpRequest,
    body: web::Either<web::Form<CreateMappingDto>, web::Json<CreateMappingDto>>,
    service: web::Data<SharedShortenerService>,
    config: web::Data<Config>,
) -> Result<impl Responder> {
    let (dto, wants_json) = match body {
        web::Either::Left(form) => (form.into_inner(), false),
        web::Either::Right(json) => (json.into_inner(), true),
    };

    let shortened = shorten(dto, &service).await?;
    let short_url = short_url(&req, &config, &shortened.code);

    let mut response = if shortened.created {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };
    response.insert_header((LOCATION, format!("/{}", shortened.code)));

    if wants_json {
        return Ok(response.json(CreateMappingResponse {
            code: shortened.code,
            url: shortened.url,
            short_url,
            created: shortened.created,
        }));
    }

    Ok(response
        .content_type(ContentType::plaintext())
        .body(short_url))
}

/// Unauthenticated creation through the query string
pub async fn public_create_handler(
    req: HttpRequest,
    query: web::Query<CreateMappingDto>,
    service: web::Data<SharedShortenerService>,
    config: web::Data<Config>,
) -> Result<impl Responder> {
    let shortened = shorten(query.into_inner(), &service).await?;
    let short_url = short_url(&req, &config, &shortened.code);

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(short_url))
}

/// Redirect route handler
pub async fn redirect_handler(
    path: web::Path<String>,
    service: web::Data<SharedShortenerService>,
) -> Result<impl Responder> {
    let code = path.into_inner();
    debug!("Redirect requested for code: {}", code);

    let url = service.resolve(&code).await?;

    info!("Redirecting '{}' to '{}'", code, url);
    Ok(HttpResponse::Found()
        .insert_header((LOCATION, url))
        .finish())
}

/// Existence probe for `HEAD /{code}`
pub async fn probe_handler(
    path: web::Path<String>,
    service: web::Data<SharedShortenerService>,
) -> Result<impl Responder> {
    let code = path.into_inner();

    if service.contains(&code).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Ok(HttpResponse::NotFound().finish())
    }
}

/// Listing route handler
pub async fn list_handler(
    req: HttpRequest,
    service: web::Data<SharedShortenerService>,
) -> Result<impl Responder> {
    let format = ListingFormat::negotiate(
        req.headers().get(ACCEPT).and_then(|v| v.to_str().ok()),
    );

    // Full scan on every call, see ShortenerServiceTrait::list_all
    let mappings = service.list_all().await?;
    debug!("Listing {} mappings as {:?}", mappings.len(), format);

    Ok(match format {
        ListingFormat::Html => HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(render_html(&mappings)),
        ListingFormat::Json => HttpResponse::Ok().json(&mappings),
        ListingFormat::Text => HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body(render_text(&mappings)),
    })
}

/// One `code<TAB>url` line per mapping
pub fn render_text(mappings: &[Mapping]) -> String {
    mappings
        .iter()
        .map(|m| format!("{}\t{}\n", m.code, m.url))
        .collect()
}

pub fn render_html(mappings: &[Mapping]) -> String {
    let rows: String = mappings
        .iter()
        .map(|m| {
            let code = escape_html(&m.code);
            let url = escape_html(&m.url);
            format!(
                "<tr><td><a href=\"/{code}\">{code}</a></td><td><a href=\"{url}\">{url}</a></td></tr>\n"
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Links</title></head>\n<body>\n\
         <table>\n<tr><th>Code</th><th>URL</th></tr>\n{rows}</table>\n</body>\n</html>\n"
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
