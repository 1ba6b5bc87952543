//! Screened usernames.
//!
//! The availability check rejects names that collide with service
//! endpoints (usernames double as subdomains) or are plain offensive.
//! Matching is exact on the lowercased name.

// Keep sorted; lookup is a binary search.
static SCREENED: &[&str] = &[
    "admin",
    "administrator",
    "anal",
    "anus",
    "api",
    "ass",
    "asshole",
    "bastard",
    "bitch",
    "blowjob",
    "boner",
    "boob",
    "clit",
    "cock",
    "cum",
    "cunt",
    "dick",
    "dildo",
    "faggot",
    "ftp",
    "fuck",
    "fucker",
    "handjob",
    "help",
    "hitler",
    "jizz",
    "login",
    "logout",
    "mail",
    "nazi",
    "nigga",
    "nigger",
    "penis",
    "piss",
    "porn",
    "porno",
    "pussy",
    "rape",
    "root",
    "sex",
    "shit",
    "signin",
    "signout",
    "signup",
    "slut",
    "smtp",
    "ssl",
    "staff",
    "support",
    "system",
    "tits",
    "twat",
    "vagina",
    "wank",
    "webmaster",
    "whore",
    "www",
    "xxx",
];

/// Returns true when the name is on the screened list.
pub fn is_screened(username: &str) -> bool {
    let name = username.to_lowercase();
    SCREENED.binary_search(&name.as_str()).is_ok()
}
