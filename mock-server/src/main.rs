use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let api_token =
        std::env::var("API_TOKEN").unwrap_or_else(|_| mock_server::DEFAULT_API_TOKEN.to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr}{}", mock_server::API_PREFIX);
    mock_server::run(listener, mock_server::app_with_token(&api_token)).await
}
