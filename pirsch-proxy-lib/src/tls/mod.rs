mod acceptor;

pub use acceptor::build_tls_acceptor;
