//! Server-rendered landing page. Everything here is a pure function of a
//! [`SubmissionSnapshot`]; no rendering path touches the controller.

use uuid::Uuid;

use super::controller::SubmissionSnapshot;

struct Feature {
    title: &'static str,
    body: &'static str,
}

const FEATURES: [Feature; 4] = [
    Feature {
        title: "Daglige oppgaver",
        body: "Få spennende oppgaver som tilpasses hvor du er. Oppdage nye steder du aldri har vært før.",
    },
    Feature {
        title: "Vinn premier",
        body: "Konkurrer om pengepremier og andre belønninger. Jo mer du utforsker, jo mer kan du vinne.",
    },
    Feature {
        title: "Lokal konkurranse",
        body: "Sammenlign poeng med venner og naboer via leaderboard. Se hvem som utforsker mest!",
    },
    Feature {
        title: "Støtt en god sak",
        body: "En del av premien doneres til ideelle organisasjoner. Utforsk og gjør en forskjell samtidig.",
    },
];

const STEPS: [Feature; 4] = [
    Feature {
        title: "Meld deg på venteliste",
        body: "Registrer din e-postadresse og bli varslet når appen lanseres.",
    },
    Feature {
        title: "Motta daglige oppgaver basert på lokasjon",
        body: "Få personlige oppgaver tilpasset området ditt og interessene dine.",
    },
    Feature {
        title: "Ta bilde og last opp for å fullføre oppgaven",
        body: "Dokumenter oppdagelsen din og del den med fellesskapet.",
    },
    Feature {
        title: "Tjen poeng, konkurrer og vinn premier",
        body: "Samle poeng, klatre på leaderboard og vinn fantastiske premier.",
    },
];

pub const FORM_ACTION: &str = "/waitlist";

/// Renders the whole landing page. Without a session the form posts without an
/// id and the first submit opens one.
pub fn render_landing_page(session_id: Option<Uuid>, snapshot: &SubmissionSnapshot) -> String {
    let form = render_email_form(session_id, snapshot);
    let mut html = String::with_capacity(8 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"nb\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>Utforsk - Oppdag nærmiljøet ditt</title>\n</head>\n<body>\n");

    html.push_str("<section class=\"hero\">\n<h1>Utforsk</h1>\n");
    html.push_str(
        "<p>Oppdag nye steder i nærmiljøet ditt – få daglige oppgaver, tjen poeng og vinn premier!</p>\n",
    );
    html.push_str(&form);
    html.push_str("</section>\n");

    html.push_str("<section class=\"features\">\n<h2>Hvorfor velge Utforsk?</h2>\n");
    html.push_str("<p>En helt ny måte å oppdage stedene rundt deg på, samtidig som du konkurrerer og støtter en god sak.</p>\n");
    push_cards(&mut html, &FEATURES, "ul");
    html.push_str("</section>\n");

    html.push_str("<section class=\"steps\">\n<h2>Slik fungerer det</h2>\n");
    html.push_str("<p>Kom i gang på få minutter og start din utforskningsreise</p>\n");
    push_cards(&mut html, &STEPS, "ol");
    html.push_str("</section>\n");

    html.push_str("<section class=\"cta\">\n<h2>Klar til å starte utforskningsreisen?</h2>\n");
    html.push_str("<p>Bli en av de første til å oppleve Utforsk. Registrer deg på ventelisten i dag!</p>\n");
    html.push_str(&form);
    html.push_str("</section>\n");

    html.push_str("<footer>\n<h3>Utforsk</h3>\n");
    html.push_str("<p>Har du spørsmål? Ta kontakt med oss: <a href=\"mailto:kontakt@utforsk.org\">kontakt@utforsk.org</a></p>\n");
    html.push_str("</footer>\n</body>\n</html>\n");
    html
}

/// Renders the sign-up form in whichever state the snapshot is in: the
/// thank-you card once completed, otherwise the form with an optional error
/// and a busy button while a submit is in flight.
pub fn render_email_form(session_id: Option<Uuid>, snapshot: &SubmissionSnapshot) -> String {
    if snapshot.is_completed {
        return concat!(
            "<div class=\"waitlist-done\">\n",
            "<p class=\"headline\">Takk for påmeldingen!</p>\n",
            "<p>Vi kontakter deg når appen er klar.</p>\n",
            "</div>\n"
        )
        .to_string();
    }

    let mut html = String::new();
    html.push_str(&format!(
        "<form class=\"waitlist-form\" method=\"post\" action=\"{FORM_ACTION}\">\n"
    ));
    if let Some(session_id) = session_id {
        html.push_str(&format!(
            "<input type=\"hidden\" name=\"session_id\" value=\"{session_id}\">\n"
        ));
    }
    html.push_str(&format!(
        "<input type=\"email\" name=\"email\" value=\"{}\" placeholder=\"Din e-postadresse\" required autocomplete=\"email\">\n",
        escape_html(&snapshot.candidate_email)
    ));

    if snapshot.is_submitting {
        html.push_str("<button type=\"submit\" disabled>Melder på...</button>\n");
    } else {
        html.push_str("<button type=\"submit\">Meld deg på venteliste</button>\n");
    }

    if let Some(error) = &snapshot.last_error {
        html.push_str(&format!(
            "<div class=\"waitlist-error\" role=\"alert\"><p>{}</p></div>\n",
            escape_html(error)
        ));
    }

    html.push_str("</form>\n");
    html
}

fn push_cards(html: &mut String, cards: &[Feature], list_tag: &str) {
    html.push_str(&format!("<{list_tag}>\n"));
    for card in cards {
        html.push_str(&format!(
            "<li><h3>{}</h3><p>{}</p></li>\n",
            card.title, card.body
        ));
    }
    html.push_str(&format!("</{list_tag}>\n"));
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
            other => escaped.push(other),
        }
    }
    escaped
}
