use crate::config::Config;
use crate::models::Category;

pub fn render_index(config: &Config, storage: &str) -> String {
    let bootstrap = serde_json::json!({
        "labels": config.labels,
        "period": config.default_period,
        "chartStyle": config.chart_style,
        "storage": storage,
    });

    let buttons: String = Category::KNOWN
        .iter()
        .map(|category| {
            let label = config.labels.label(category);
            format!(
                r#"<form method="post" action="/log/{key}" data-category="{key}"><button class="log-btn" type="submit"><span class="emoji">{emoji}</span>{name}</button></form>"#,
                key = category.key(),
                emoji = escape_html(&label.emoji),
                name = escape_html(&label.name),
            )
        })
        .collect();

    INDEX_HTML
        .replace("{{BUTTONS}}", &buttons)
        .replace("{{STORAGE}}", &escape_html(storage))
        .replace("{{BOOTSTRAP}}", &bootstrap.to_string().replace("</", "<\\/"))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Habit Tracker</title>
  <style>
    :root {
      --bg: #f4f1ea;
      --ink: #26272b;
      --muted: #77726b;
      --card: #ffffff;
      --line: rgba(38, 39, 43, 0.1);
      --beer: #e3a72f;
      --wine: #8e2c48;
      --liquor: #b5651d;
      --smoking: #5b6770;
      --error: #c63b2b;
      --ok: #2d7a4b;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Helvetica Neue", sans-serif;
      display: grid;
      place-items: start center;
      padding: 28px 16px 48px;
    }

    .app {
      width: min(880px, 100%);
      display: grid;
      gap: 22px;
    }

    header { display: flex; justify-content: space-between; align-items: baseline; gap: 12px; flex-wrap: wrap; }
    h1 { margin: 0; font-size: 1.9rem; }
    .mode { color: var(--muted); font-size: 0.85rem; text-transform: uppercase; letter-spacing: 0.1em; }

    .categories { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 12px; }
    .log-btn {
      width: 100%;
      border: 1px solid var(--line);
      border-radius: 16px;
      background: var(--card);
      padding: 16px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      display: flex;
      align-items: center;
      justify-content: center;
      gap: 10px;
    }
    .log-btn:disabled { opacity: 0.5; cursor: wait; }
    .log-btn .emoji { font-size: 1.5rem; }

    .controls { display: flex; flex-wrap: wrap; gap: 12px; align-items: center; justify-content: space-between; }
    .tabs, .toggle { display: flex; gap: 4px; padding: 4px; background: var(--line); border-radius: 999px; }
    .tabs button, .toggle button {
      border: none;
      background: transparent;
      border-radius: 999px;
      padding: 7px 14px;
      font-weight: 600;
      color: var(--muted);
      cursor: pointer;
    }
    .tabs button.active, .toggle button.active { background: var(--card); color: var(--ink); }
    select { padding: 7px 10px; border-radius: 10px; border: 1px solid var(--line); font-size: 0.95rem; }

    .card { background: var(--card); border: 1px solid var(--line); border-radius: 18px; padding: 16px; }
    .view[hidden] { display: none; }

    #chart { width: 100%; height: 260px; display: block; }
    .chart-grid { stroke: var(--line); }
    .chart-label { fill: var(--muted); font-size: 11px; }
    .legend { display: flex; gap: 14px; flex-wrap: wrap; font-size: 0.85rem; color: var(--muted); margin-top: 8px; }
    .legend i { display: inline-block; width: 10px; height: 10px; border-radius: 3px; margin-right: 6px; }

    ul.log { list-style: none; margin: 0; padding: 0; display: grid; gap: 6px; }
    ul.log li { display: flex; align-items: center; gap: 10px; padding: 8px 4px; border-bottom: 1px solid var(--line); }
    ul.log time { color: var(--muted); font-size: 0.9rem; margin-left: auto; }
    ul.log button { border: none; background: transparent; color: var(--error); cursor: pointer; font-size: 1rem; }

    table { width: 100%; border-collapse: collapse; }
    th, td { text-align: right; padding: 8px 6px; border-bottom: 1px solid var(--line); }
    th:first-child, td:first-child { text-align: left; }

    .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(170px, 1fr)); gap: 12px; }
    .stat .label { display: block; font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.1em; color: var(--muted); }
    .stat .value { display: block; font-size: 1.6rem; font-weight: 600; margin-top: 4px; }
    .stat .detail { display: block; font-size: 0.85rem; color: var(--muted); margin-top: 2px; }

    .status { min-height: 1.3em; font-size: 0.95rem; color: var(--muted); }
    .status[data-type="error"] { color: var(--error); }
    .status[data-type="ok"] { color: var(--ok); }
    .empty { color: var(--muted); text-align: center; padding: 18px; }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Habit Tracker</h1>
      <span class="mode">Storage: {{STORAGE}}</span>
    </header>

    <section class="categories" id="categories">{{BUTTONS}}</section>

    <div class="status" id="status" role="status"></div>

    <section class="controls">
      <div class="tabs" role="tablist">
        <button type="button" data-view="log" class="active">Log</button>
        <button type="button" data-view="table">Table</button>
        <button type="button" data-view="overview">Overview</button>
      </div>
      <label>Period
        <select id="period">
          <option value="7">7 days</option>
          <option value="30">30 days</option>
          <option value="90">90 days</option>
          <option value="365">365 days</option>
        </select>
      </label>
      <div class="toggle" id="chart-style">
        <button type="button" data-style="bar">Bars</button>
        <button type="button" data-style="line">Lines</button>
      </div>
    </section>

    <section class="card">
      <svg id="chart" viewBox="0 0 600 260" role="img" aria-label="Entries per period"></svg>
      <div class="legend" id="legend"></div>
    </section>

    <section class="card view" data-view="log">
      <ul class="log" id="log"></ul>
    </section>

    <section class="card view" data-view="table" hidden>
      <table>
        <thead id="table-head"></thead>
        <tbody id="table-body"></tbody>
      </table>
    </section>

    <section class="view stats" data-view="overview" id="overview" hidden></section>
  </main>

  <script>
    const boot = {{BOOTSTRAP}};
    const CATEGORIES = ['beer', 'wine', 'liquor', 'smoking'];
    const COLORS = { beer: 'var(--beer)', wine: 'var(--wine)', liquor: 'var(--liquor)', smoking: 'var(--smoking)' };

    const statusEl = document.getElementById('status');
    const chartEl = document.getElementById('chart');
    const legendEl = document.getElementById('legend');
    const logEl = document.getElementById('log');
    const tableHeadEl = document.getElementById('table-head');
    const tableBodyEl = document.getElementById('table-body');
    const overviewEl = document.getElementById('overview');
    const periodEl = document.getElementById('period');
    const tabs = Array.from(document.querySelectorAll('.tabs button'));
    const styleButtons = Array.from(document.querySelectorAll('#chart-style button'));
    const views = Array.from(document.querySelectorAll('.view'));
    const forms = Array.from(document.querySelectorAll('#categories form'));

    let chartStyle = boot.chartStyle;
    let busy = false;
    let statusTimer = null;
    let report = null;

    const label = (key) => {
      const entry = boot.labels[key];
      if (entry) {
        return entry;
      }
      return { emoji: boot.labels.fallback.emoji, name: key || boot.labels.fallback.name };
    };

    const escape = (value) => String(value).replace(/[&<>"']/g, (ch) => ({
      '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
    })[ch]);

    const setStatus = (message, type, sticky) => {
      if (statusTimer) {
        clearTimeout(statusTimer);
        statusTimer = null;
      }
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
      if (message && !sticky) {
        statusTimer = setTimeout(() => setStatus('', ''), type === 'error' ? 5000 : 1500);
      }
    };

    const setBusy = (value) => {
      busy = value;
      forms.forEach((form) => {
        form.querySelector('button').disabled = value;
      });
    };

    const request = async (url, options) => {
      const res = await fetch(url, options);
      if (!res.ok) {
        const error = new Error((await res.text()) || `Request failed (${res.status})`);
        error.status = res.status;
        throw error;
      }
      return res.status === 204 ? null : res.json();
    };

    const renderChart = () => {
      const buckets = report ? report.buckets : [];
      if (!buckets.length) {
        chartEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
        legendEl.innerHTML = '';
        return;
      }

      const width = 600;
      const height = 260;
      const left = 36;
      const right = 12;
      const top = 16;
      const bottom = 30;
      const plotWidth = width - left - right;
      const plotHeight = height - top - bottom;

      const stacked = chartStyle === 'bar';
      const peak = Math.max(1, ...buckets.map((bucket) => stacked
        ? CATEGORIES.reduce((sum, key) => sum + bucket.counts[key], 0)
        : Math.max(...CATEGORIES.map((key) => bucket.counts[key]))));
      const y = (value) => top + plotHeight - (value / peak) * plotHeight;
      const slot = plotWidth / buckets.length;
      const x = (index) => left + slot * index + slot / 2;

      let svg = '';
      for (let i = 0; i <= 4; i += 1) {
        const value = (peak * i) / 4;
        svg += `<line class="chart-grid" x1="${left}" x2="${width - right}" y1="${y(value)}" y2="${y(value)}" />`;
        svg += `<text class="chart-label" x="${left - 6}" y="${y(value) + 4}" text-anchor="end">${Math.round(value * 10) / 10}</text>`;
      }

      if (stacked) {
        const barWidth = Math.max(2, slot * 0.7);
        buckets.forEach((bucket, index) => {
          let base = 0;
          CATEGORIES.forEach((key) => {
            const count = bucket.counts[key];
            if (!count) {
              return;
            }
            svg += `<rect x="${x(index) - barWidth / 2}" y="${y(base + count)}" width="${barWidth}" height="${y(base) - y(base + count)}" fill="${COLORS[key]}"><title>${escape(bucket.label)}: ${count} ${escape(label(key).name)}</title></rect>`;
            base += count;
          });
        });
      } else {
        CATEGORIES.forEach((key) => {
          const path = buckets
            .map((bucket, index) => `${index === 0 ? 'M' : 'L'} ${x(index).toFixed(2)} ${y(bucket.counts[key]).toFixed(2)}`)
            .join(' ');
          svg += `<path d="${path}" fill="none" stroke="${COLORS[key]}" stroke-width="2.5" />`;
        });
      }

      const labelEvery = Math.ceil(buckets.length / 10);
      buckets.forEach((bucket, index) => {
        if (index % labelEvery === 0) {
          svg += `<text class="chart-label" x="${x(index)}" y="${height - 10}" text-anchor="middle">${escape(bucket.label)}</text>`;
        }
      });

      chartEl.innerHTML = svg;
      legendEl.innerHTML = `<span>${escape(report.granularity_label)}</span>` + CATEGORIES
        .map((key) => `<span><i style="background:${COLORS[key]}"></i>${escape(label(key).emoji)} ${escape(label(key).name)}</span>`)
        .join('');
    };

    const renderLog = (events) => {
      if (!events.length) {
        logEl.innerHTML = '<li class="empty">Nothing logged yet</li>';
        return;
      }
      logEl.innerHTML = events.map((event) => {
        const entry = label(event.category);
        const when = new Date(event.timestamp).toLocaleString();
        return `<li><span>${escape(entry.emoji)}</span><span>${escape(entry.name)}</span><time>${escape(when)}</time>`
          + `<button type="button" data-id="${escape(event.id)}" title="Delete">✕</button></li>`;
      }).join('');
    };

    const renderTable = () => {
      tableHeadEl.innerHTML = '<tr><th>Day</th>'
        + CATEGORIES.map((key) => `<th>${escape(label(key).emoji)}</th>`).join('')
        + '<th>Total</th></tr>';
      const rows = report ? report.table : [];
      if (!rows.length) {
        tableBodyEl.innerHTML = `<tr><td class="empty" colspan="${CATEGORIES.length + 2}">No entries in this period</td></tr>`;
        return;
      }
      tableBodyEl.innerHTML = rows.map((row) => `<tr><td>${escape(row.date)}</td>`
        + CATEGORIES.map((key) => `<td>${row.counts[key]}</td>`).join('')
        + `<td>${row.total}</td></tr>`).join('');
    };

    const stat = (title, value, detail) => `<div class="card stat"><span class="label">${escape(title)}</span>`
      + `<span class="value">${escape(value)}</span><span class="detail">${escape(detail || '')}</span></div>`;

    const renderOverview = () => {
      if (!report) {
        overviewEl.innerHTML = '';
        return;
      }
      const s = report.statistics;
      const cards = CATEGORIES.map((key) => stat(
        `${label(key).emoji} ${label(key).name}`,
        s.totals[key],
        `${s.per_day_average[key].toFixed(1)} per day`
      ));
      cards.push(stat('Total', s.grand_total, `over ${s.days} days`));
      cards.push(stat('Weekdays', s.weekday.total, `${s.weekday.average.toFixed(1)} per day across ${s.weekday.day_count} days`));
      cards.push(stat('Weekends', s.weekend.total, `${s.weekend.average.toFixed(1)} per day across ${s.weekend.day_count} days`));
      overviewEl.innerHTML = cards.join('');
    };

    const refresh = async () => {
      const [events, next] = await Promise.all([
        request('/api/events'),
        request(`/api/report?period=${periodEl.value}`)
      ]);
      report = next;
      renderLog(events);
      renderChart();
      renderTable();
      renderOverview();
    };

    const recover = async (err) => {
      if (err.status === 409) {
        setStatus('Data changed elsewhere, reloading...', 'error', true);
        await request('/api/reload', { method: 'POST' });
        await refresh();
        setStatus('Reloaded. Please try again.', 'error');
        return;
      }
      setStatus(err.message, 'error');
    };

    const mutate = async (work, done) => {
      if (busy) {
        return;
      }
      setBusy(true);
      setStatus('Saving...', 'info', true);
      try {
        await work();
        await refresh();
        setStatus(done, 'ok');
      } catch (err) {
        await recover(err).catch((inner) => setStatus(inner.message, 'error'));
      } finally {
        setBusy(false);
      }
    };

    forms.forEach((form) => {
      form.addEventListener('submit', (event) => {
        event.preventDefault();
        const category = form.dataset.category;
        mutate(() => request('/api/events', {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify({ category })
        }), `${label(category).emoji} logged`);
      });
    });

    logEl.addEventListener('click', (event) => {
      const button = event.target.closest('button[data-id]');
      if (!button || !confirm('Delete this entry?')) {
        return;
      }
      mutate(() => request(`/api/events/${encodeURIComponent(button.dataset.id)}`, { method: 'DELETE' }), 'Deleted');
    });

    const showView = (name) => {
      tabs.forEach((tab) => tab.classList.toggle('active', tab.dataset.view === name));
      views.forEach((view) => { view.hidden = view.dataset.view !== name; });
    };

    const setChartStyle = (style) => {
      chartStyle = style;
      styleButtons.forEach((button) => button.classList.toggle('active', button.dataset.style === style));
      renderChart();
    };

    tabs.forEach((tab) => tab.addEventListener('click', () => showView(tab.dataset.view)));
    styleButtons.forEach((button) => button.addEventListener('click', () => setChartStyle(button.dataset.style)));
    periodEl.addEventListener('change', () => refresh().catch((err) => setStatus(err.message, 'error')));

    periodEl.value = String(boot.period);
    setChartStyle(chartStyle);
    setStatus('Loading...', 'info', true);
    refresh()
      .then(() => setStatus('', ''))
      .catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;
