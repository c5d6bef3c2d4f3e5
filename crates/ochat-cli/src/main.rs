// ochat CLI entry point

use ochat_cli::{output, router::CommandRouter};

#[tokio::main]
async fn main() {
    let result = CommandRouter::route().await;

    // Exit with appropriate code
    if let Err(e) = result {
        tracing::debug!("{}", e.technical_details());
        output::print_error(&e.user_message());
        std::process::exit(1);
    }
}
