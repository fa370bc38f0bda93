use std::sync::Arc;

use tinyweb::http::content;
use tinyweb::http::cookie::Cookie;
use tinyweb::{Application, Error, FormValue, Reply, Route, Settings, Status};

fn build(settings: Settings) -> anyhow::Result<Application> {
    let mut app = Application::new(settings);

    app.get("/", |_req, _args| Ok("Hello from tinyweb\n"))?;

    app.route_with(
        Route::new("GET", r"/hello/(\w+)")?.query("greeting"),
        |req, args| {
            req.response_cookies.set(Cookie::new("visited", "1").path("/"));
            let name = args.positional(0).unwrap_or("stranger");
            Ok(format!("{} {name}\n", args.keyword_or("greeting", "Hello")))
        },
    );

    app.post(
        "/echo",
        content::json(|req, _args| {
            let form = req.form()?;
            let fields: serde_json::Map<String, serde_json::Value> = form
                .iter()
                .map(|(name, value)| (name.to_string(), describe(value)))
                .collect();
            Ok(fields)
        }),
    )?;

    app.get(r"/count/(\d{1,4})", |_req, args| {
        let upto: u32 = args.positional(0).unwrap_or("0").parse().map_err(Error::fault)?;
        Ok(Reply::stream((1..=upto).map(|i| Ok::<_, Error>(format!("{i}\n")))))
    })?;

    app.get("/old", |_req, _args| -> Result<(), Error> {
        Err(Status::found("/").into())
    })?;

    Ok(app)
}

fn describe(value: &FormValue) -> serde_json::Value {
    match value {
        FormValue::Text(s) => s.clone().into(),
        FormValue::List(values) => values.clone().into(),
        FormValue::File(file) => format!("<file {} ({} bytes)>", file.filename, file.data.len()).into(),
        FormValue::Files(files) => files.iter().map(|f| f.filename.clone()).collect::<Vec<_>>().into(),
        FormValue::Json(value) => value.clone(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let settings = Settings::load();
    let addr = settings.listen_addr.clone();

    let app = Arc::new(build(settings)?);
    app.ready();

    tokio::select! {
        res = tinyweb::server::listener::run(Arc::clone(&app), &addr) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    app.shutdown();
    Ok(())
}
