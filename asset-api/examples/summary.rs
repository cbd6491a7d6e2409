use asset_api::{AssetApiError, Client, Request};

#[tokio::main]
pub async fn main() -> Result<(), AssetApiError> {
    let client = Client::default();

    let summary = client.send(Request::summary().get()).await?;
    println!(
        "total assets {} across {} accounts",
        summary.total_assets,
        summary.accounts.len()
    );
    Ok(())
}
