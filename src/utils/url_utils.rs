// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 提取URL的域名
///
/// 限流与熔断都以此为分组键。解析失败或无主机名的URL
/// 返回None，调用方应在入队之前拒绝这类种子。
///
/// # 参数
///
/// * `url_str` - 待解析的URL
///
/// # 返回值
///
/// 小写的主机名，无法提取时为None
pub fn domain_of(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str).ok()?;
    url.host_str().map(|host| host.to_lowercase())
}
