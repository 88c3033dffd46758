use std::io::ErrorKind;
use std::sync::Arc;

use bytes::BufMut;
use futures::TryStreamExt;
use log::{debug, error, info, warn};
use percent_encoding::percent_decode_str;
use serde::{de::DeserializeOwned, Deserialize};
use warp::http::{self, header, HeaderValue, StatusCode, Uri};
use warp::multipart::FormData;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::appointment::Booking;
use crate::backend::CreateError;
use crate::clinic::{Clinic, Error, Visit};
use crate::session::{Category, Flash, SESSION_COOKIE};
use crate::user::{Credentials, Registration};
use crate::views;

const FORM_LIMIT: u64 = 64 * 1024;
const UPLOAD_LIMIT: u64 = 16 * 1024 * 1024;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContactMessage {
    nombre: String,
    email: String,
    mensaje: String,
}

pub fn routes(
    clinic: Arc<Clinic>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let visit = with_visit(clinic);

    let home = warp::path::end()
        .and(warp::get())
        .and(visit.clone())
        .and_then(home);

    let register = warp::path!("register").and(
        warp::get()
            .and(visit.clone())
            .and_then(register_form)
            .or(warp::post()
                .and(visit.clone())
                .and(form::<Registration>())
                .and_then(register))
            .unify(),
    );

    let login = warp::path!("login").and(
        warp::get()
            .and(visit.clone())
            .and_then(login_form)
            .or(warp::post()
                .and(visit.clone())
                .and(form::<Credentials>())
                .and_then(login))
            .unify(),
    );

    let dashboard = warp::path!("dashboard")
        .and(warp::get())
        .and(visit.clone())
        .and_then(dashboard);

    let citas = warp::path!("citas").and(
        warp::get()
            .and(visit.clone())
            .and_then(citas_form)
            .or(warp::post()
                .and(visit.clone())
                .and(form::<Vec<(String, String)>>())
                .and_then(book))
            .unify(),
    );

    let contact = warp::path!("contact").and(
        warp::get()
            .and(visit.clone())
            .and_then(contact_form)
            .or(warp::post()
                .and(visit.clone())
                .and(form::<ContactMessage>())
                .and_then(contact))
            .unify(),
    );

    let authorization = warp::path!("authorization").and(
        warp::get()
            .and(visit.clone())
            .and_then(authorization_form)
            .or(warp::post()
                .and(visit.clone())
                .and(warp::multipart::form().max_length(UPLOAD_LIMIT))
                .and_then(upload))
            .unify(),
    );

    let results = {
        let list = warp::path!("results")
            .and(warp::get())
            .and(visit.clone())
            .and_then(results);

        let download = warp::path!("results" / "download" / String)
            .and(warp::get())
            .and(visit.clone())
            .and_then(download_result);

        list.or(download).unify()
    };

    let pdf = warp::path!("descargar_pdf")
        .and(warp::get())
        .and(visit.clone())
        .and_then(download_pdf);

    let logout = warp::path!("logout")
        .and(warp::get())
        .and(visit)
        .and_then(logout);

    home.or(register)
        .unify()
        .or(login)
        .unify()
        .or(dashboard)
        .unify()
        .or(citas)
        .unify()
        .or(contact)
        .unify()
        .or(authorization)
        .unify()
        .or(results)
        .unify()
        .or(pdf)
        .unify()
        .or(logout)
        .unify()
        .recover(handle_rejection)
        .with(warp::log("citas"))
}

fn with_visit(
    clinic: Arc<Clinic>,
) -> impl Filter<Extract = (Visit,), Error = std::convert::Infallible> + Clone {
    warp::cookie::optional(SESSION_COOKIE).then(move |cookie: Option<String>| {
        let clinic = Arc::clone(&clinic);
        async move { clinic.visit(cookie.as_deref()).await }
    })
}

fn form<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(FORM_LIMIT).and(warp::body::form())
}

/// Attaches the session cookie when the visit was handed a new token.
fn respond(visit: &Visit, reply: impl Reply) -> Response {
    let mut res = reply.into_response();

    if visit.is_fresh() {
        let cookie = visit.session_id().cookie(visit.clinic().secure());

        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                res.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!("couldn't encode session cookie: {e}"),
        }
    }

    res
}

fn redirect(visit: &Visit, to: &'static str) -> Response {
    respond(visit, warp::redirect::see_other(Uri::from_static(to)))
}

async fn render(visit: &Visit, view: impl FnOnce(&[Flash]) -> String) -> Response {
    let flashes = visit.take_flashes().await;
    respond(visit, warp::reply::html(view(&flashes)))
}

fn attachment(filename: &str, content_type: &str, data: Vec<u8>) -> Result<Response, Rejection> {
    http::Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename.replace('"', "")),
        )
        .body(data.into())
        .map_err(|e| {
            error!("couldn't build attachment response for {filename}: {e}");
            warp::reject::custom(Error::Internal)
        })
}

async fn home(visit: Visit) -> Result<Response, Rejection> {
    Ok(render(&visit, views::home).await)
}

async fn register_form(visit: Visit) -> Result<Response, Rejection> {
    Ok(render(&visit, views::register).await)
}

async fn register(visit: Visit, registration: Registration) -> Result<Response, Rejection> {
    match visit.clinic().register(registration).await {
        Ok(()) => {
            visit
                .flash(
                    Category::Success,
                    "Registro exitoso. Por favor, inicia sesión.",
                )
                .await;
            Ok(redirect(&visit, "/login"))
        }
        Err(CreateError::Exists) => {
            visit.flash(Category::Danger, "El usuario ya existe.").await;
            Ok(render(&visit, views::register).await)
        }
    }
}

async fn login_form(visit: Visit) -> Result<Response, Rejection> {
    Ok(render(&visit, views::login).await)
}

async fn login(visit: Visit, creds: Credentials) -> Result<Response, Rejection> {
    match visit.login(creds).await {
        Ok(authed) => {
            let visit = authed.visit();
            visit
                .flash(Category::Success, "Inicio de sesión exitoso.")
                .await;
            Ok(redirect(visit, "/dashboard"))
        }
        Err(visit) => {
            visit
                .flash(Category::Danger, "Usuario o contraseña incorrectos.")
                .await;
            Ok(redirect(&visit, "/login"))
        }
    }
}

async fn dashboard(visit: Visit) -> Result<Response, Rejection> {
    match visit.authed().await {
        Ok(authed) => {
            let username = authed.username();
            Ok(render(authed.visit(), |flashes| views::dashboard(flashes, username)).await)
        }
        Err(visit) => {
            visit.flash(Category::Warning, "Debe iniciar sesión.").await;
            Ok(redirect(&visit, "/login"))
        }
    }
}

async fn citas_form(visit: Visit) -> Result<Response, Rejection> {
    match visit.authed().await {
        Ok(authed) => Ok(render(authed.visit(), views::citas).await),
        Err(visit) => Ok(redirect(&visit, "/login")),
    }
}

async fn book(visit: Visit, fields: Vec<(String, String)>) -> Result<Response, Rejection> {
    let authed = match visit.authed().await {
        Ok(authed) => authed,
        Err(visit) => return Ok(redirect(&visit, "/login")),
    };

    authed.book(Booking::from_pairs(fields)).await;

    let visit = authed.visit();
    visit
        .flash(Category::Success, "Citas agendadas exitosamente.")
        .await;
    Ok(redirect(visit, "/dashboard"))
}

async fn contact_form(visit: Visit) -> Result<Response, Rejection> {
    Ok(render(&visit, views::contact).await)
}

async fn contact(visit: Visit, msg: ContactMessage) -> Result<Response, Rejection> {
    info!(
        "contact from {} <{}>: {} chars",
        msg.nombre,
        msg.email,
        msg.mensaje.chars().count()
    );
    debug!("contact message: {}", msg.mensaje);

    visit
        .flash(
            Category::Success,
            "Gracias por tu mensaje. Nos comunicaremos contigo pronto.",
        )
        .await;
    Ok(redirect(&visit, "/dashboard"))
}

async fn authorization_form(visit: Visit) -> Result<Response, Rejection> {
    Ok(render(&visit, views::authorization).await)
}

/// The first `document` field's client file name and contents.
async fn find_document(form: FormData) -> Result<Option<(String, Vec<u8>)>, warp::Error> {
    let mut parts = Box::pin(form);

    while let Some(part) = parts.try_next().await? {
        if part.name() != "document" {
            continue;
        }

        let filename = part.filename().unwrap_or_default().to_string();
        let data = part
            .stream()
            .try_fold(Vec::new(), |mut data, buf| async move {
                data.put(buf);
                Ok::<_, warp::Error>(data)
            })
            .await?;

        return Ok(Some((filename, data)));
    }

    Ok(None)
}

async fn upload(visit: Visit, form: FormData) -> Result<Response, Rejection> {
    let document = find_document(form).await.map_err(|e| {
        error!("couldn't read upload: {e}");
        warp::reject::custom(Error::BadRequest)
    })?;

    let Some((filename, data)) = document.filter(|(name, _)| !name.is_empty()) else {
        warn!("upload without a document");
        visit
            .flash(Category::Danger, "No se ha seleccionado ningún archivo.")
            .await;
        return Ok(redirect(&visit, "/authorization"));
    };

    visit
        .clinic()
        .files()
        .save_upload(&filename, &data)
        .await
        .map_err(|e| {
            error!("couldn't save upload {filename:?}: {e}");
            warp::reject::custom(Error::Internal)
        })?;

    visit
        .flash(Category::Success, "Documento cargado exitosamente.")
        .await;
    Ok(redirect(&visit, "/dashboard"))
}

async fn results(visit: Visit) -> Result<Response, Rejection> {
    let files = visit.clinic().files().list_results().await.map_err(|e| {
        error!("couldn't list results: {e}");
        warp::reject::custom(Error::Internal)
    })?;

    Ok(render(&visit, |flashes| views::results(flashes, &files)).await)
}

async fn download_result(name: String, visit: Visit) -> Result<Response, Rejection> {
    let name = percent_decode_str(&name)
        .decode_utf8()
        .map_err(|_| Error::NotFound)?
        .into_owned();

    let data = visit
        .clinic()
        .files()
        .read_result(&name)
        .await
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                debug!("no result {name:?}");
                warp::reject::custom(Error::NotFound)
            } else {
                error!("couldn't read result {name:?}: {e}");
                warp::reject::custom(Error::Internal)
            }
        })?;

    let mime = mime_guess::from_path(&name).first_or_octet_stream();
    Ok(respond(&visit, attachment(&name, mime.as_ref(), data)?))
}

async fn download_pdf(visit: Visit) -> Result<Response, Rejection> {
    let authed = match visit.authed().await {
        Ok(authed) => authed,
        Err(visit) => return Ok(redirect(&visit, "/login")),
    };

    match authed.export_pdf().await? {
        Some(export) => {
            let res = attachment(&export.filename, "application/pdf", export.data)?;
            Ok(respond(authed.visit(), res))
        }
        None => {
            let visit = authed.visit();
            visit
                .flash(
                    Category::Warning,
                    "No hay citas agendadas para generar PDF.",
                )
                .await;
            Ok(redirect(visit, "/dashboard"))
        }
    }
}

async fn logout(visit: Visit) -> Result<Response, Rejection> {
    visit.logout().await;
    visit.flash(Category::Info, "Sesión cerrada.").await;
    Ok(redirect(&visit, "/login"))
}

async fn handle_rejection(err: Rejection) -> Result<Response, Rejection> {
    if let Some(e) = err.find::<Error>() {
        let status: StatusCode = (*e).into();
        let body = status.canonical_reason().unwrap_or("error");

        return Ok(warp::reply::with_status(body, status).into_response());
    }

    Err(err)
}
