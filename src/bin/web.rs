use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use thyro_scinti::{
    generate_with, Pathology, Point, RegionOutline, RevealPlan, SamplerConfig, SimulationConfig,
};

#[derive(Deserialize, Default)]
struct SampleQuery {
    size: Option<u32>,
    pathology: Option<String>,
    count: Option<usize>,
    multiplier: Option<usize>,
    steps: Option<usize>,
    point_size: Option<f32>,
    alpha: Option<f32>,
    animate: Option<bool>,
    delay: Option<u64>,
    seed: Option<u64>,
    patch_seed: Option<u64>,
}

#[derive(Serialize)]
struct SampleResponse {
    pathology: Pathology,
    label: &'static str,
    title: String,
    size: u32,
    count: usize,
    outline: RegionOutline,
    points: Vec<Point>,
    frames: Vec<usize>,
    delay_ms: u64,
    point_size: f32,
    alpha: f32,
    note: Option<String>,
}

#[derive(Serialize)]
struct PathologyInfo {
    slug: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl SampleQuery {
    fn into_config(self) -> SimulationConfig {
        let defaults = SimulationConfig::default();
        SimulationConfig {
            size: self.size.unwrap_or(defaults.size),
            pathology: self
                .pathology
                .as_deref()
                .map(Pathology::from_label)
                .unwrap_or(defaults.pathology),
            base_count: self.count.unwrap_or(defaults.base_count),
            multiplier: self.multiplier.unwrap_or(defaults.multiplier),
            steps: self.steps.unwrap_or(defaults.steps),
            animate: self.animate.unwrap_or(defaults.animate),
            frame_delay_ms: self.delay.unwrap_or(defaults.frame_delay_ms),
            point_size: self.point_size.unwrap_or(defaults.point_size),
            alpha: self.alpha.unwrap_or(defaults.alpha),
            sample_seed: self.seed.unwrap_or(defaults.sample_seed),
            patch_seed: self.patch_seed.unwrap_or(defaults.patch_seed),
        }
        .clamped()
    }
}

const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Thyroid scintigraphy (simulation)</title>
    <style>
      html, body { margin: 0; padding: 0; background: #f4f5f7; color: #1d2330; font-family: "Segoe UI", sans-serif; }
      #layout { display: flex; gap: 18px; padding: 18px; align-items: flex-start; }
      #panel { width: 280px; background: #fff; padding: 14px; border: 1px solid #d7dbe2; border-radius: 10px; }
      .brand { font-size: 16px; font-weight: 600; }
      .row { display: flex; flex-direction: column; margin-top: 10px; font-size: 12px; color: #4a5263; }
      .row span { margin-bottom: 4px; }
      select, input[type="range"] { width: 100%; }
      button { margin-top: 14px; width: 100%; padding: 7px; border-radius: 6px; border: 1px solid #3c6a9e; background: #1f77b4; color: #fff; cursor: pointer; }
      #stage { background: #fff; border: 1px solid #d7dbe2; border-radius: 10px; padding: 12px; }
      #title { font-size: 14px; margin-bottom: 8px; }
      #status { font-size: 12px; color: #6b7385; margin-top: 6px; }
      .note { font-size: 11px; color: #7f8895; margin-top: 14px; }
    </style>
  </head>
  <body>
    <div id="layout">
      <div id="panel">
        <div class="brand">Simulated gamma emissions</div>
        <label class="row"><span>Pathology</span>
          <select id="pathology"></select>
        </label>
        <label class="row"><span>Image size (px): <b id="sizeVal">600</b></span>
          <input id="size" type="range" min="200" max="1000" step="50" value="600" />
        </label>
        <label class="row"><span>Base emissions (x4 internally): <b id="countVal">3000</b></span>
          <input id="count" type="range" min="100" max="20000" step="100" value="3000" />
        </label>
        <label class="row"><span>Animation steps: <b id="stepsVal">30</b></span>
          <input id="steps" type="range" min="1" max="100" step="1" value="30" />
        </label>
        <label class="row"><span>Point size: <b id="pointVal">8</b></span>
          <input id="point" type="range" min="1" max="20" step="1" value="8" />
        </label>
        <label class="row"><span>Opacity: <b id="alphaVal">0.70</b></span>
          <input id="alpha" type="range" min="0.1" max="1" step="0.05" value="0.7" />
        </label>
        <label class="row" style="flex-direction: row; gap: 6px;">
          <input id="animate" type="checkbox" checked /> <span>Play animation</span>
        </label>
        <button id="go">Generate</button>
        <div class="note">Teaching simulation of thyroid scintigraphy. Not for diagnostic use.</div>
      </div>
      <div id="stage">
        <div id="title"></div>
        <canvas id="canvas" width="600" height="600"></canvas>
        <div id="status"></div>
      </div>
    </div>
    <script>
      const $ = (id) => document.getElementById(id);
      const bind = (id, label, fmt) => {
        const update = () => { $(label).textContent = fmt($(id).value); };
        $(id).addEventListener("input", update);
        update();
      };
      bind("size", "sizeVal", (v) => v);
      bind("count", "countVal", (v) => v);
      bind("steps", "stepsVal", (v) => v);
      bind("point", "pointVal", (v) => v);
      bind("alpha", "alphaVal", (v) => Number(v).toFixed(2));

      let playback = 0;

      function drawFrame(data, visible, final) {
        const canvas = $("canvas");
        const ctx = canvas.getContext("2d");
        const size = data.size;
        ctx.fillStyle = "#ffffff";
        ctx.fillRect(0, 0, size, size);
        ctx.globalAlpha = data.alpha;
        ctx.fillStyle = "#1f77b4";
        const r = Math.max(0.5, 0.9 * Math.sqrt(data.point_size));
        for (let i = 0; i < visible; i++) {
          const p = data.points[i];
          ctx.beginPath();
          ctx.arc(p[0], size - p[1], r, 0, 2 * Math.PI);
          ctx.fill();
        }
        ctx.globalAlpha = 1.0;
        const o = data.outline;
        ctx.setLineDash([7, 4]);
        ctx.strokeStyle = "#000000";
        ctx.lineWidth = 1.2;
        ctx.beginPath();
        ctx.ellipse(o.center[0], size - o.center[1], o.width / 2, o.height / 2, 0, 0, 2 * Math.PI);
        ctx.stroke();
        ctx.setLineDash([]);
        $("title").textContent = final ? data.title + " (final)" : data.title;
        $("status").textContent = visible + " of " + data.count + " emissions";
      }

      function play(data) {
        const run = ++playback;
        const canvas = $("canvas");
        canvas.width = data.size;
        canvas.height = data.size;
        let i = 0;
        const step = () => {
          if (run !== playback) return;
          const last = i === data.frames.length - 1;
          drawFrame(data, data.frames[i], last);
          i += 1;
          if (!last) setTimeout(step, data.delay_ms);
        };
        step();
      }

      async function generate() {
        const params = new URLSearchParams({
          pathology: $("pathology").value,
          size: $("size").value,
          count: $("count").value,
          steps: $("steps").value,
          point_size: $("point").value,
          alpha: $("alpha").value,
          animate: $("animate").checked,
        });
        $("status").textContent = "sampling...";
        const res = await fetch("/samples?" + params.toString());
        const data = await res.json();
        if (!res.ok) {
          $("status").textContent = data.error;
          return;
        }
        play(data);
      }

      async function init() {
        const res = await fetch("/pathologies");
        const list = await res.json();
        for (const p of list) {
          const opt = document.createElement("option");
          opt.value = p.slug;
          opt.textContent = p.label;
          $("pathology").appendChild(opt);
        }
        $("go").addEventListener("click", generate);
        generate();
      }
      init();
    </script>
  </body>
</html>
"##;

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn pathologies() -> impl IntoResponse {
    let list: Vec<PathologyInfo> = Pathology::ALL
        .iter()
        .map(|p| PathologyInfo {
            slug: p.slug(),
            label: p.label(),
        })
        .collect();
    Json(list)
}

async fn samples(Query(q): Query<SampleQuery>) -> Response {
    sample_response(q, SamplerConfig::default()).await
}

async fn sample_response(q: SampleQuery, sampler: SamplerConfig) -> Response {
    let requested_pathology = q.pathology.clone();
    let config = q.into_config();

    let note = requested_pathology
        .filter(|raw| Pathology::parse(raw).is_none())
        .map(|raw| format!("unknown pathology '{raw}', showing normal uptake"));

    let job = config.clone();
    let scene = match tokio::task::spawn_blocking(move || generate_with(&job, &sampler)).await {
        Ok(Ok(scene)) => scene,
        Ok(Err(e)) => {
            error!(error = %e, "sampling failed");
            let body = ErrorResponse {
                error: e.to_string(),
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
        }
        Err(e) => {
            error!(error = %e, "sampling task panicked");
            let body = ErrorResponse {
                error: "sampling task failed".to_string(),
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    let sequencer = config.sequencer();
    let out = SampleResponse {
        pathology: scene.pathology,
        label: scene.pathology.label(),
        title: scene.title(false),
        size: config.size,
        count: scene.points.len(),
        outline: scene.outline(),
        frames: RevealPlan::new(scene.points.len(), sequencer.steps).counts(),
        points: scene.points,
        delay_ms: sequencer.delay.as_millis() as u64,
        point_size: config.point_size,
        alpha: config.alpha,
        note,
    };
    Json(out).into_response()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = Router::new()
        .route("/", get(index))
        .route("/pathologies", get(pathologies))
        .route("/samples", get(samples));

    let addr: SocketAddr = std::env::var("THYRO_ADDR")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "bind failed");
            std::process::exit(1);
        }
    };
    info!("serving on http://{addr}");
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_and_clamps() {
        let config = SampleQuery::default().into_config();
        assert_eq!(config, SimulationConfig::default());

        let config = SampleQuery {
            size: Some(10_000),
            count: Some(5),
            pathology: Some("cold-nodule".to_string()),
            ..SampleQuery::default()
        }
        .into_config();
        assert_eq!(config.size, 1000);
        assert_eq!(config.base_count, 100);
        assert_eq!(config.pathology, Pathology::ColdNodule);
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn small_query(pathology: &str) -> SampleQuery {
        SampleQuery {
            pathology: Some(pathology.to_string()),
            count: Some(100),
            multiplier: Some(1),
            steps: Some(4),
            ..SampleQuery::default()
        }
    }

    #[tokio::test]
    async fn test_samples_returns_points_and_frames() {
        let response = samples(Query(small_query("Kalter Knoten"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["pathology"], "cold-nodule");
        assert_eq!(body["count"], 100);
        assert_eq!(body["points"].as_array().unwrap().len(), 100);
        assert_eq!(body["frames"], serde_json::json!([25, 50, 75, 100]));
        assert!(body["note"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_pathology_adds_note() {
        let response = samples(Query(small_query("graves"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["pathology"], "normal");
        let note = body["note"].as_str().unwrap();
        assert!(note.contains("graves"), "note: {note}");
    }

    #[tokio::test]
    async fn test_sampling_failure_is_unprocessable() {
        let sampler = SamplerConfig {
            pool_factor: 0,
            min_pool: 0,
        };
        let response = sample_response(small_query("normal"), sampler).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("insufficient candidates"), "error: {error}");
    }
}
