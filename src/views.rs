//! HTML pages. Each page takes the flashes pending for the session and shows
//! them above its own content.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::session::Flash;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn page(title: &str, flashes: &[Flash], body: &str) -> String {
    let messages: String = flashes
        .iter()
        .map(|flash| {
            format!(
                r#"<div class="alert alert-{}">{}</div>"#,
                flash.category.as_str(),
                flash.message,
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
<nav><a href="/">Inicio</a> | <a href="/dashboard">Panel</a> | <a href="/contact">Contacto</a> | <a href="/logout">Cerrar sesión</a></nav>
{messages}
<main>
{body}
</main>
</body>
</html>
"#
    )
}

pub fn home(flashes: &[Flash]) -> String {
    page(
        "Citas médicas",
        flashes,
        r#"<h1>Citas médicas</h1>
<p><a href="/login">Iniciar sesión</a> o <a href="/register">registrarse</a>.</p>"#,
    )
}

pub fn register(flashes: &[Flash]) -> String {
    page(
        "Registro",
        flashes,
        r#"<h1>Registro</h1>
<form method="post" action="/register">
<input name="username" placeholder="Usuario">
<input name="password" type="password" placeholder="Contraseña">
<input name="email" type="email" placeholder="Correo">
<button type="submit">Registrarse</button>
</form>"#,
    )
}

pub fn login(flashes: &[Flash]) -> String {
    page(
        "Iniciar sesión",
        flashes,
        r#"<h1>Iniciar sesión</h1>
<form method="post" action="/login">
<input name="username" placeholder="Usuario">
<input name="password" type="password" placeholder="Contraseña">
<button type="submit">Entrar</button>
</form>"#,
    )
}

pub fn dashboard(flashes: &[Flash], username: &str) -> String {
    page(
        "Panel",
        flashes,
        &format!(
            r#"<h1>Bienvenido, {}</h1>
<ul>
<li><a href="/citas">Agendar citas</a></li>
<li><a href="/descargar_pdf">Descargar citas en PDF</a></li>
<li><a href="/authorization">Cargar autorización</a></li>
<li><a href="/results">Resultados</a></li>
<li><a href="/contact">Contacto</a></li>
</ul>"#,
            escape(username)
        ),
    )
}

const BOOKING_ROWS: usize = 3;

pub fn citas(flashes: &[Flash]) -> String {
    let rows: String = (0..BOOKING_ROWS)
        .map(|_| {
            r#"<fieldset>
<input name="especialidad[]" placeholder="Especialidad">
<input name="medico[]" placeholder="Médico">
<input name="fecha[]" type="date">
<input name="hora[]" type="time">
</fieldset>
"#
        })
        .collect();

    page(
        "Agendar citas",
        flashes,
        &format!(
            r#"<h1>Agendar citas</h1>
<form method="post" action="/citas">
{rows}<button type="submit">Agendar</button>
</form>"#
        ),
    )
}

pub fn contact(flashes: &[Flash]) -> String {
    page(
        "Contacto",
        flashes,
        r#"<h1>Contacto</h1>
<form method="post" action="/contact">
<input name="nombre" placeholder="Nombre">
<input name="email" type="email" placeholder="Correo">
<textarea name="mensaje"></textarea>
<button type="submit">Enviar</button>
</form>"#,
    )
}

pub fn authorization(flashes: &[Flash]) -> String {
    page(
        "Autorizaciones",
        flashes,
        r#"<h1>Cargar autorización</h1>
<form method="post" action="/authorization" enctype="multipart/form-data">
<input name="document" type="file">
<button type="submit">Cargar</button>
</form>"#,
    )
}

pub fn results(flashes: &[Flash], files: &[String]) -> String {
    let list: String = files
        .iter()
        .map(|name| {
            format!(
                "<li><a href=\"/results/download/{}\">{}</a></li>\n",
                utf8_percent_encode(name, NON_ALPHANUMERIC),
                escape(name),
            )
        })
        .collect();

    page(
        "Resultados",
        flashes,
        &format!("<h1>Resultados</h1>\n<ul>\n{list}</ul>"),
    )
}
