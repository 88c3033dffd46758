use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
pub struct Args {
    /// Whether clients connect to citas over https.
    /// If so, the session cookie is sent as a secure cookie.
    #[arg(short, long)]
    secure: bool,

    /// The address citas should listen on. By default
    /// citas will listen just on the IPv4 loopback.
    #[arg(short, long)]
    address: Option<String>,

    /// The port citas listens on.
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Directory holding `uploads/` and `results/`.
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory exported appointment PDFs are written to.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

impl Args {
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.address
            .as_deref()
            .unwrap_or("127.0.0.1")
            .parse()
            .map(|addr: IpAddr| (addr, self.port).into())
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn export_dir(&self) -> &PathBuf {
        &self.export_dir
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_to_loopback() {
        let args = Args::parse_from(["citas"]);

        assert_eq!(args.addr().unwrap(), SocketAddr::from(([127, 0, 0, 1], 5000)));
        assert!(!args.secure());
        assert_eq!(args.data_dir(), &PathBuf::from("."));
    }

    #[test]
    fn rejects_bad_address() {
        let args = Args::parse_from(["citas", "--address", "not-an-ip", "--port", "8080"]);

        assert!(args.addr().is_err());
    }
}
