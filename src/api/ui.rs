// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedded browser UI served at `GET /`

use axum::response::Html;

/// Single page: upload, preview, list decoded payloads, draw boxes on demand
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>QR Detection</title>
<style>
  body { font-family: sans-serif; margin: 2rem auto; max-width: 960px; }
  img, canvas { max-width: 100%; display: block; margin: 1rem 0; }
  .error { color: #b00020; }
  #boxes-button { display: none; }
</style>
</head>
<body>
<h1>QR Code Detection</h1>
<h2>Upload an image to detect the QR code and get the information it contains</h2>

<input id="file" type="file" accept="image/jpeg,image/png">
<img id="preview" alt="Original image" hidden>
<p id="status"></p>

<h3 id="results-title" hidden>QR Code Detection Results</h3>
<div id="results"></div>

<button id="boxes-button">Display image with Bounding Boxes</button>
<canvas id="canvas" hidden></canvas>

<script>
const fileInput = document.getElementById('file');
const preview = document.getElementById('preview');
const statusLine = document.getElementById('status');
const resultsTitle = document.getElementById('results-title');
const results = document.getElementById('results');
const boxesButton = document.getElementById('boxes-button');
const canvas = document.getElementById('canvas');

let predictions = [];

function reset() {
  predictions = [];
  results.innerHTML = '';
  resultsTitle.hidden = true;
  boxesButton.style.display = 'none';
  canvas.hidden = true;
  statusLine.textContent = '';
  statusLine.className = '';
}

function line(text) {
  const p = document.createElement('p');
  p.textContent = text;
  results.appendChild(p);
}

fileInput.addEventListener('change', async () => {
  reset();
  const file = fileInput.files[0];
  if (!file) return;

  preview.src = URL.createObjectURL(file);
  preview.hidden = false;

  const form = new FormData();
  form.append('file', file);

  statusLine.textContent = 'Detecting QR codes...';
  try {
    const response = await fetch('/predict-qr/', { method: 'POST', body: form });
    if (!response.ok) {
      statusLine.textContent = 'Error making prediction: ' + response.status;
      statusLine.className = 'error';
      return;
    }
    const body = await response.json();
    predictions = body.predictions || [];
    statusLine.textContent = '';
    resultsTitle.hidden = false;

    if (predictions.length === 0) {
      line('No QR codes were detected in the image.');
    } else {
      predictions.forEach((p, i) => {
        line('QR Code ' + (i + 1) + ':');
        line('QR content: ' + p.qr_content);
      });
    }
    boxesButton.style.display = 'inline-block';
  } catch (err) {
    statusLine.textContent = 'Error making prediction: ' + err;
    statusLine.className = 'error';
  }
});

boxesButton.addEventListener('click', () => {
  canvas.width = preview.naturalWidth;
  canvas.height = preview.naturalHeight;
  const ctx = canvas.getContext('2d');
  ctx.drawImage(preview, 0, 0);
  ctx.strokeStyle = 'red';
  ctx.lineWidth = 3;
  predictions.forEach((p) => {
    ctx.strokeRect(p.x_min, p.y_min, p.x_max - p.x_min, p.y_max - p.y_min);
  });
  canvas.hidden = false;
});
</script>
</body>
</html>
"#;

/// GET / - Browser UI
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
