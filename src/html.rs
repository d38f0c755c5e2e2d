//! Static page bundled into the generated output.
//!
//! The page reads `maps.json`, then for every view fetches its county and
//! school layers plus the legend and hands them to Leaflet. Styles, marker
//! options and popup markup all come precomputed in feature properties.

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Oregon High Schools</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<style>
  body { margin: 0; font-family: sans-serif; }
  .map { height: 600px; margin-bottom: 1em; }
  .info.legend { background: rgba(255, 255, 255, 0.9); padding: 6px 8px; line-height: 18px; }
  .info.legend i { width: 18px; height: 18px; float: left; margin-right: 8px; opacity: 0.7; }
</style>
</head>
<body>
<div id="maps"></div>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script>
function drawView(view) {
  const container = document.createElement('div');
  container.id = view.id;
  container.className = 'map';
  document.getElementById('maps').appendChild(container);

  const map = L.map(view.id, { center: view.center, zoom: view.zoom });
  L.tileLayer(view.tiles.url, {
    attribution: view.tiles.attribution,
    minZoom: view.tiles.minZoom,
    maxZoom: view.tiles.maxZoom
  }).addTo(map);

  const layer = name => fetch(`${view.id}/${name}`);
  return Promise.all([
    layer('counties.geojson').then(res => res.json()),
    layer('schools.geojson').then(res => res.json()),
    layer('legend.html').then(res => res.text())
  ])
  .then(([counties, schools, legendHtml]) => {
    L.geoJSON(counties, {
      style: feature => feature.properties.style,
      onEachFeature: (feature, l) => l.bindPopup(feature.properties.popup)
    }).addTo(map);

    L.geoJSON(schools, {
      pointToLayer: (feature, latlng) => L.circleMarker(latlng, feature.properties.marker),
      onEachFeature: (feature, l) => l.bindPopup(feature.properties.popup)
    }).addTo(map);

    const legend = L.control({ position: view.legendPosition });
    legend.onAdd = () => {
      const div = L.DomUtil.create('div', 'info legend');
      div.innerHTML = legendHtml;
      return div;
    };
    legend.addTo(map);
  })
  .catch(error => console.error('Error loading data:', error));
}

fetch('maps.json')
  .then(res => res.json())
  .then(views => views.forEach(drawView))
  .catch(error => console.error('Error loading data:', error));
</script>
</body>
</html>
"#;
