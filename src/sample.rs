use std::path::Path;

use anyhow::Context;
use log::info;

pub(crate) struct SamplePost {
    pub title: &'static str,
    pub date: &'static str,
    pub tags: &'static [&'static str],
    pub content: &'static str,
}

pub(crate) const SAMPLE_POSTS: [SamplePost; 3] = [
    SamplePost {
        title: "欢迎来到我的博客",
        date: "2026-01-26",
        tags: &["随笔", "生活"],
        content: "# 欢迎来到我的博客

这是使用全新的静态博客生成器创建的第一篇文章。

## 特点

这个博客生成器具有以下特点：

- **简洁设计**：极简主义风格
- **快速加载**：纯静态页面
- **响应式**：适配所有设备
- **暗色模式**：保护你的眼睛

希望你喜欢这个全新的博客设计！
",
    },
    SamplePost {
        title: "关于技术分享",
        date: "2026-01-25",
        tags: &["技术", "思考"],
        content: "# 关于技术分享

技术是不断进步的，分享让知识流动得更快。

## 学习方式

1. 实践是最好的老师
2. 记录学习笔记
3. 与他人交流讨论
4. 持续迭代改进

让我们一起在技术的道路上前行！
",
    },
    SamplePost {
        title: "代码之美",
        date: "2026-01-24",
        tags: &["编程", "美学"],
        content: "# 代码之美

优雅的代码就像诗歌一样令人愉悦。

## 编程哲学

> \"简单是复杂的终极境界。\" - 达芬奇

好的代码应该：

- 易于理解
- 易于维护
- 高效运行
- 遵循最佳实践

```javascript
function fibonacci(n) {
  if (n <= 1) return n;
  return fibonacci(n - 1) + fibonacci(n - 2);
}
```
",
    },
];

impl SamplePost {
    fn to_source(&self) -> String {
        let tags = self
            .tags
            .iter()
            .map(|tag| format!("\"{tag}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "---\ntitle: \"{}\"\ndate: {}\ntags: [{}]\n---\n\n{}",
            self.title, self.date, tags, self.content
        )
    }
}

/// Writes the sample posts into `posts_dir` as `<title>.md`, creating the
/// directory if needed.
pub(crate) fn write_samples(posts_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(posts_dir)
        .with_context(|| format!("while creating {posts_dir:?}"))?;
    for sample in SAMPLE_POSTS.iter() {
        let path = posts_dir.join(format!("{}.md", sample.title));
        std::fs::write(&path, sample.to_source())
            .with_context(|| format!("while writing sample post {path:?}"))?;
        info!("Created sample post {path:?}");
    }
    Ok(())
}
