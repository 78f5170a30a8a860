//! The exit funnel. Every wrapper run ends in [`Reporter::terminate`], which logs the
//! outcome, mirrors failures to syslog (and, for CGI, to the HTTP response), then exits.

use std::ffi::CString;
use std::io::Write;

use crate::invocation::Mode;
use crate::outcome::ExitOutcome;

/// Everything the funnel emits for one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub status: i32,
    /// `<ident> (exit <code>): <message>`; `None` on success.
    pub log_line: Option<String>,
    /// Full CGI response body for failures in CGI mode.
    pub cgi_page: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Reporter {
    ident: String,
    mode: Mode,
}

impl Reporter {
    pub fn new(ident: impl Into<String>, mode: Mode) -> Self {
        Self {
            ident: ident.into(),
            mode,
        }
    }

    pub fn render(&self, outcome: &ExitOutcome) -> Report {
        let status = outcome.status_code();
        let Some(message) = outcome.message() else {
            return Report {
                status,
                log_line: None,
                cgi_page: None,
            };
        };
        let log_line = format!("{} (exit {}): {}", self.ident, status, message);
        let cgi_page = (self.mode == Mode::CgiFixed).then(|| cgi_error_page(&log_line));
        Report {
            status,
            log_line: Some(log_line),
            cgi_page,
        }
    }

    /// Emit the report without exiting.
    pub fn emit(&self, report: &Report) {
        let Some(line) = &report.log_line else {
            log::info!("{}: dispatched (exit {})", self.ident, report.status);
            return;
        };
        log::error!("{}", line);
        write_syslog(&self.ident, line);
        if let Some(page) = &report.cgi_page {
            let mut stdout = std::io::stdout();
            // Nothing left to report a write failure to.
            let _ = stdout.write_all(page.as_bytes());
            let _ = stdout.flush();
        }
    }

    /// Report `outcome` and exit with its status code.
    pub fn terminate(&self, outcome: ExitOutcome) -> ! {
        let report = self.render(&outcome);
        self.emit(&report);
        std::process::exit(report.status)
    }
}

fn cgi_error_page(log_line: &str) -> String {
    format!(
        "Content-type: text/html\n\n\
         <head><title>Mailing list CGI error</title></head><body>\n\
         <h1>Mailing list CGI error</h1>\n\
         The CGI wrapper encountered a fatal error. \
         This entry is being stored in your syslog:\n\
         <pre>\n{}</pre>\n</body>\n",
        html_escape(log_line)
    )
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

fn write_syslog(ident: &str, line: &str) {
    // Interior NULs cannot cross the C boundary; drop them rather than the entry.
    let (Ok(ident), Ok(line)) = (
        CString::new(ident.replace('\0', "")),
        CString::new(line.replace('\0', "")),
    ) else {
        return;
    };
    // openlog keeps the ident pointer until closelog; `ident` outlives both calls.
    unsafe {
        libc::openlog(ident.as_ptr(), libc::LOG_CONS, libc::LOG_MAIL);
        libc::syslog(libc::LOG_ERR, c"%s".as_ptr(), line.as_ptr());
        libc::closelog();
    }
}
