//! Appointment list rendering.
//!
//! The layout is a title line followed by one free-text line per
//! appointment; long lines wrap at word boundaries and pages break when full.

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::appointment::Appointment;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const MARGIN_BOTTOM: f32 = 20.0;
const LINE_HEIGHT: f32 = 10.0;
const FONT_SIZE: f32 = 12.0;

/// Average Helvetica advance at `FONT_SIZE`, in mm.
const CHAR_WIDTH: f32 = FONT_SIZE * 0.5 * 0.3528;
const WRAP_COLUMNS: usize = ((PAGE_WIDTH - 2.0 * MARGIN) / CHAR_WIDTH) as usize;

const ROWS_PER_PAGE: usize =
    ((PAGE_HEIGHT - MARGIN - LINE_HEIGHT - MARGIN_BOTTOM) / LINE_HEIGHT) as usize + 1;
// title and the gap beneath it
const TITLE_ROWS: usize = 2;

pub fn filename(username: &str) -> String {
    format!("citas_{username}.pdf")
}

pub fn title(username: &str) -> String {
    format!("Citas Agendadas para {username}")
}

pub fn body_lines(appointments: &[Appointment]) -> Vec<String> {
    appointments
        .iter()
        .flat_map(|appt| wrap(&appt.to_string(), WRAP_COLUMNS))
        .collect()
}

fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = vec![];
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;

        while word.chars().count() > columns {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(columns)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
        }

        let needed = current.chars().count() + word.chars().count() + !current.is_empty() as usize;
        if needed > columns && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
}

/// Splits body lines into pages, the first page shares its space with the title.
fn paginate(lines: Vec<String>) -> Vec<Vec<String>> {
    let mut pages = vec![];
    let mut page = vec![];
    let mut capacity = ROWS_PER_PAGE - TITLE_ROWS;

    for line in lines {
        if page.len() == capacity {
            pages.push(std::mem::take(&mut page));
            capacity = ROWS_PER_PAGE;
        }
        page.push(line);
    }
    pages.push(page);

    pages
}

pub fn render(username: &str, appointments: &[Appointment]) -> Result<Vec<u8>, printpdf::Error> {
    let title = title(username);
    let (doc, page, layer) = PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "citas");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let top = PAGE_HEIGHT - MARGIN - LINE_HEIGHT;

    let title_width = title.chars().count() as f32 * CHAR_WIDTH;
    let title_x = ((PAGE_WIDTH - title_width) / 2.0).max(MARGIN);

    let mut first = Some((page, layer));

    for (i, lines) in paginate(body_lines(appointments)).into_iter().enumerate() {
        let (page, layer) = match first.take() {
            Some(first) => first,
            None => doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("citas {}", i + 1)),
        };
        let layer = doc.get_page(page).get_layer(layer);
        let mut y = top;

        if i == 0 {
            layer.use_text(title.as_str(), FONT_SIZE, Mm(title_x), Mm(y), &font);
            y -= LINE_HEIGHT * TITLE_ROWS as f32;
        }

        for line in lines {
            layer.use_text(line, FONT_SIZE, Mm(MARGIN), Mm(y), &font);
            y -= LINE_HEIGHT;
        }
    }

    doc.save_to_bytes()
}

#[cfg(test)]
pub mod test {
    use super::*;

    fn appt(specialty: &str, doctor: &str, date: &str, time: &str) -> Appointment {
        Appointment {
            specialty: specialty.into(),
            doctor: doctor.into(),
            date: date.into(),
            time: time.into(),
        }
    }

    #[test]
    fn one_line_per_appointment() {
        let appts = [
            appt("Cardiología", "Dr. Pérez", "2024-05-01", "10:00"),
            appt("Pediatría", "Dra. Ruiz", "2024-05-03", "08:15"),
        ];

        assert_eq!(
            body_lines(&appts),
            [
                "Cardiología con Dr. Pérez el 2024-05-01 a las 10:00",
                "Pediatría con Dra. Ruiz el 2024-05-03 a las 08:15",
            ]
        );
    }

    #[test]
    fn long_lines_wrap() {
        let long = "x".repeat(10);
        let lines = wrap(&format!("{long} {long} {long}"), 21);

        assert_eq!(lines, [format!("{long} {long}"), long.clone()]);

        let lines = wrap(&"y".repeat(25), 10);
        assert_eq!(lines, ["y".repeat(10), "y".repeat(10), "y".repeat(5)]);
    }

    #[test]
    fn empty_fields_still_render_a_line() {
        let lines = body_lines(&[appt("", "", "", "")]);

        assert_eq!(lines, ["con el a las"]);
    }

    #[test]
    fn pages_break_when_full() {
        let lines: Vec<_> = (0..ROWS_PER_PAGE * 2).map(|i| i.to_string()).collect();

        let pages = paginate(lines);

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), ROWS_PER_PAGE - TITLE_ROWS);
        assert_eq!(pages[1].len(), ROWS_PER_PAGE);
        assert_eq!(pages[2].len(), TITLE_ROWS);
        assert_eq!(pages[1][0], (ROWS_PER_PAGE - TITLE_ROWS).to_string());
    }

    /// Builtin fonts take WinAnsi text, written out as a hex string.
    pub fn shown_text(text: &str) -> Vec<u8> {
        let hex: String = text.chars().map(|c| format!("{:02X}", c as u32)).collect();
        format!("<{hex}>").into_bytes()
    }

    pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn renders_a_pdf() {
        let bytes = render("ana", &[appt("Cardiología", "Dr. Pérez", "2024-05-01", "10:00")]).unwrap();

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, &shown_text("Citas Agendadas para ana")));
        assert!(contains(
            &bytes,
            &shown_text("Cardiología con Dr. Pérez el 2024-05-01 a las 10:00")
        ));
        assert!(!contains(&bytes, &shown_text("Pediatría")));
        assert_eq!(filename("ana"), "citas_ana.pdf");
        assert_eq!(title("ana"), "Citas Agendadas para ana");
    }
}
